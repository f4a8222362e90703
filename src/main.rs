mod editor;
mod graph;
mod layout;
mod node_types;
mod palette;
mod submit;
mod variables;

use clap::Parser;
use editor::style::EditorStyle;
use editor::GraphEditor;
use graph::PipelineGraph;
use std::sync::mpsc::Receiver;
use submit::SubmitEvent;

#[derive(Parser, Debug)]
#[command(name = "pipeline-studio", about = "Visual pipeline editor")]
struct Args {
    /// Analysis endpoint the pipeline is submitted to.
    #[arg(long, default_value = "http://127.0.0.1:8000/pipelines/parse")]
    endpoint: String,
}

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Pipeline Studio"),
        ..Default::default()
    };
    eframe::run_native(
        "Pipeline Studio",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(StudioApp::new(args.endpoint)))
        }),
    )
}

struct StudioApp {
    graph: PipelineGraph,
    editor: GraphEditor,
    style: EditorStyle,
    endpoint: String,
    logs: Vec<String>,
    submit_rx: Option<Receiver<SubmitEvent>>,
}

impl StudioApp {
    fn new(endpoint: String) -> Self {
        Self {
            graph: PipelineGraph::default(),
            editor: GraphEditor::default(),
            style: EditorStyle::default(),
            endpoint,
            logs: Vec::new(),
            submit_rx: None,
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{message}");
        self.logs
            .push(format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), message));
    }

    fn poll_submission(&mut self) {
        let Some(rx) = &self.submit_rx else { return };
        let mut channel_closed = false;
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(std::sync::mpsc::TryRecvError::Empty) => break,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    channel_closed = true;
                    break;
                }
            }
        }
        let got_event = !events.is_empty();
        for event in events {
            match event {
                SubmitEvent::Verdict(text) => self.log(text),
                SubmitEvent::Failed(reason) => self.log(format!("Submission failed: {reason}")),
            }
        }
        // One event per request; closed without one means the worker
        // dropped the sender early.
        if got_event || channel_closed {
            if channel_closed && !got_event {
                self.log("Submission failed: no response received");
            }
            self.submit_rx = None;
        }
    }

    fn submit_pipeline(&mut self) {
        self.log(format!(
            "Submitting {} nodes and {} edges to {}",
            self.graph.nodes.len(),
            self.graph.edges.len(),
            self.endpoint
        ));
        match submit::submit(&self.endpoint, &self.graph) {
            Ok(rx) => self.submit_rx = Some(rx),
            Err(err) => self.log(format!("Submission failed: {err:#}")),
        }
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_submission();
        if self.submit_rx.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("palette").show(ctx, |ui| {
            ui.add_space(4.0);
            palette::palette_row(ui, &self.style);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status")
            .resizable(true)
            .default_height(120.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    let in_flight = self.submit_rx.is_some();
                    let can_submit = !self.graph.nodes.is_empty() && !in_flight;
                    if ui
                        .add_enabled(can_submit, egui::Button::new("Submit Pipeline"))
                        .clicked()
                    {
                        self.submit_pipeline();
                    }
                    if in_flight {
                        ui.spinner();
                        ui.label("waiting for analysis...");
                    } else {
                        ui.label(format!(
                            "{} nodes, {} edges",
                            self.graph.nodes.len(),
                            self.graph.edges.len()
                        ));
                    }
                });
                ui.separator();
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for line in &self.logs {
                            ui.monospace(line);
                        }
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.editor.show(ui, &mut self.graph, &self.style);
        });
    }
}
