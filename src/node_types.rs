//! Node type registry.
//!
//! Every node kind the palette offers is described declaratively here:
//! title, base dimensions, editable fields, static ports and the flags
//! that drive dynamic behavior. A single generic renderer
//! ([`crate::editor::node_widget`]) consumes these descriptors; adding a
//! node type means adding a descriptor, not a renderer.

/// The closed set of node types the editor knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Input,
    Llm,
    Output,
    Text,
    Math,
    Filter,
    Delay,
    Counter,
    Logger,
}

impl NodeKind {
    /// Palette order.
    pub const ALL: [NodeKind; 9] = [
        NodeKind::Input,
        NodeKind::Llm,
        NodeKind::Output,
        NodeKind::Text,
        NodeKind::Math,
        NodeKind::Filter,
        NodeKind::Delay,
        NodeKind::Counter,
        NodeKind::Logger,
    ];

    /// Stable wire identifier, used in node instances, theme lookups and
    /// the submission payload.
    pub fn type_id(self) -> &'static str {
        match self {
            NodeKind::Input => "customInput",
            NodeKind::Llm => "llm",
            NodeKind::Output => "customOutput",
            NodeKind::Text => "text",
            NodeKind::Math => "math",
            NodeKind::Filter => "filter",
            NodeKind::Delay => "delay",
            NodeKind::Counter => "counter",
            NodeKind::Logger => "logger",
        }
    }

    /// Resolve a wire identifier back to a kind. `None` means the type
    /// id is unknown to the registry; callers decide whether that is a
    /// hard configuration error (structural rendering) or a soft
    /// fallback (theme colors).
    pub fn from_type_id(id: &str) -> Option<NodeKind> {
        NodeKind::ALL.iter().copied().find(|k| k.type_id() == id)
    }
}

/// Widget kind for one editable field. Closed enum, matched
/// exhaustively at render time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldKind {
    /// Single-line text input.
    Text,
    /// Multi-line text input.
    TextArea,
    /// Numeric input (value still stored as a string on the wire).
    Number,
    /// Dropdown over a fixed, non-empty option list.
    Select(&'static [&'static str]),
}

/// One editable field of a node type. `name` is unique within the type.
#[derive(Clone, Copy, Debug)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default_value: &'static str,
}

/// One statically declared connection port.
#[derive(Clone, Copy, Debug)]
pub struct PortDescriptor {
    pub id: &'static str,
}

/// Immutable shape of one node type.
#[derive(Clone, Copy, Debug)]
pub struct NodeDescriptor {
    pub kind: NodeKind,
    pub title: &'static str,
    pub base_width: f32,
    pub base_height: f32,
    pub fields: &'static [FieldDescriptor],
    pub inputs: &'static [PortDescriptor],
    pub outputs: &'static [PortDescriptor],
    /// Static descriptive text shown in the block body.
    pub body_text: Option<&'static str>,
    /// Name of the field whose text is scanned for `{{variable}}`
    /// references; each distinct reference becomes an extra input port.
    pub text_source: Option<&'static str>,
    /// Whether the block grows with the text source's length/line count.
    pub dynamic_size: bool,
}

impl NodeDescriptor {
    /// Declared default for a field, or `None` if the type has no such
    /// field.
    pub fn field_default(&self, name: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.default_value)
    }
}

const INPUT: NodeDescriptor = NodeDescriptor {
    kind: NodeKind::Input,
    title: "Input",
    base_width: 220.0,
    base_height: 120.0,
    fields: &[
        FieldDescriptor {
            name: "inputName",
            label: "Name",
            kind: FieldKind::Text,
            default_value: "input_1",
        },
        FieldDescriptor {
            name: "inputType",
            label: "Type",
            kind: FieldKind::Select(&["Text", "File"]),
            default_value: "Text",
        },
    ],
    inputs: &[],
    outputs: &[PortDescriptor { id: "value" }],
    body_text: None,
    text_source: None,
    dynamic_size: false,
};

const LLM: NodeDescriptor = NodeDescriptor {
    kind: NodeKind::Llm,
    title: "LLM",
    base_width: 220.0,
    base_height: 120.0,
    fields: &[],
    inputs: &[PortDescriptor { id: "system" }, PortDescriptor { id: "prompt" }],
    outputs: &[PortDescriptor { id: "response" }],
    body_text: Some("This is a Large Language Model."),
    text_source: None,
    dynamic_size: false,
};

const OUTPUT: NodeDescriptor = NodeDescriptor {
    kind: NodeKind::Output,
    title: "Output",
    base_width: 220.0,
    base_height: 120.0,
    fields: &[
        FieldDescriptor {
            name: "outputName",
            label: "Name",
            kind: FieldKind::Text,
            default_value: "output_1",
        },
        FieldDescriptor {
            name: "outputType",
            label: "Type",
            kind: FieldKind::Select(&["Text", "Image"]),
            default_value: "Text",
        },
    ],
    inputs: &[PortDescriptor { id: "value" }],
    outputs: &[],
    body_text: None,
    text_source: None,
    dynamic_size: false,
};

const TEXT: NodeDescriptor = NodeDescriptor {
    kind: NodeKind::Text,
    title: "Text",
    base_width: 250.0,
    base_height: 150.0,
    fields: &[FieldDescriptor {
        name: "text",
        label: "Text",
        kind: FieldKind::TextArea,
        default_value: "",
    }],
    inputs: &[],
    outputs: &[PortDescriptor { id: "output" }],
    body_text: None,
    text_source: Some("text"),
    dynamic_size: true,
};

const MATH: NodeDescriptor = NodeDescriptor {
    kind: NodeKind::Math,
    title: "Math",
    base_width: 200.0,
    base_height: 130.0,
    fields: &[FieldDescriptor {
        name: "operation",
        label: "Operation",
        kind: FieldKind::Select(&["add", "subtract", "multiply", "divide"]),
        default_value: "add",
    }],
    inputs: &[PortDescriptor { id: "input1" }, PortDescriptor { id: "input2" }],
    outputs: &[PortDescriptor { id: "result" }],
    body_text: None,
    text_source: None,
    dynamic_size: false,
};

const FILTER: NodeDescriptor = NodeDescriptor {
    kind: NodeKind::Filter,
    title: "Filter",
    base_width: 200.0,
    base_height: 120.0,
    fields: &[FieldDescriptor {
        name: "condition",
        label: "Condition",
        kind: FieldKind::Text,
        default_value: "value > 0",
    }],
    inputs: &[PortDescriptor { id: "input" }],
    outputs: &[PortDescriptor { id: "filtered" }],
    body_text: None,
    text_source: None,
    dynamic_size: false,
};

const DELAY: NodeDescriptor = NodeDescriptor {
    kind: NodeKind::Delay,
    title: "Delay",
    base_width: 180.0,
    base_height: 110.0,
    fields: &[FieldDescriptor {
        name: "seconds",
        label: "Seconds",
        kind: FieldKind::Number,
        default_value: "1",
    }],
    inputs: &[PortDescriptor { id: "input" }],
    outputs: &[PortDescriptor { id: "output" }],
    body_text: None,
    text_source: None,
    dynamic_size: false,
};

const COUNTER: NodeDescriptor = NodeDescriptor {
    kind: NodeKind::Counter,
    title: "Counter",
    base_width: 160.0,
    base_height: 100.0,
    fields: &[FieldDescriptor {
        name: "start",
        label: "Start",
        kind: FieldKind::Number,
        default_value: "0",
    }],
    inputs: &[],
    outputs: &[PortDescriptor { id: "count" }],
    body_text: None,
    text_source: None,
    dynamic_size: false,
};

const LOGGER: NodeDescriptor = NodeDescriptor {
    kind: NodeKind::Logger,
    title: "Logger",
    base_width: 170.0,
    base_height: 90.0,
    fields: &[],
    inputs: &[PortDescriptor { id: "input" }],
    outputs: &[PortDescriptor { id: "output" }],
    body_text: Some("Logs input to console"),
    text_source: None,
    dynamic_size: false,
};

/// Look up the descriptor for a node kind.
pub fn descriptor(kind: NodeKind) -> &'static NodeDescriptor {
    match kind {
        NodeKind::Input => &INPUT,
        NodeKind::Llm => &LLM,
        NodeKind::Output => &OUTPUT,
        NodeKind::Text => &TEXT,
        NodeKind::Math => &MATH,
        NodeKind::Filter => &FILTER,
        NodeKind::Delay => &DELAY,
        NodeKind::Counter => &COUNTER,
        NodeKind::Logger => &LOGGER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ids_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_type_id(kind.type_id()), Some(kind));
        }
        assert_eq!(NodeKind::from_type_id("transformer"), None);
        assert_eq!(NodeKind::from_type_id(""), None);
    }

    #[test]
    fn field_names_unique_within_type() {
        for kind in NodeKind::ALL {
            let desc = descriptor(kind);
            for (i, field) in desc.fields.iter().enumerate() {
                assert!(
                    desc.fields[i + 1..].iter().all(|f| f.name != field.name),
                    "duplicate field {} on {:?}",
                    field.name,
                    kind
                );
            }
        }
    }

    #[test]
    fn select_fields_have_options() {
        for kind in NodeKind::ALL {
            for field in descriptor(kind).fields {
                if let FieldKind::Select(options) = field.kind {
                    assert!(!options.is_empty(), "{:?}.{}", kind, field.name);
                    assert!(options.contains(&field.default_value));
                }
            }
        }
    }

    #[test]
    fn only_text_derives_ports() {
        for kind in NodeKind::ALL {
            let desc = descriptor(kind);
            assert_eq!(desc.text_source.is_some(), kind == NodeKind::Text);
            assert_eq!(desc.dynamic_size, kind == NodeKind::Text);
        }
        let text = descriptor(NodeKind::Text);
        assert_eq!(text.field_default("text"), Some(""));
        assert_eq!(text.field_default("missing"), None);
    }
}
