//! Rendering of generated declarations, bindings and handler stubs.
//!
//! The same functions feed the first-generation template and incremental
//! insertions, so both produce identical text for a field.

use uibind_types::{FieldDescriptor, HandlerKind};

/// `public <type> <name>;`
pub fn declaration(field: &FieldDescriptor) -> String {
    format!("public {} {};", field.field_type, field.name)
}

/// Listener registration for one handler of `field`.
pub fn binding(field: &FieldDescriptor, kind: HandlerKind) -> String {
    let method = kind.method_name(&field.name);
    let (params, args) = if kind.takes_value() {
        ("(value)", "value")
    } else {
        ("()", "")
    };
    format!(
        "{}.{}.AddListener({params}=>{method}({args}));",
        field.name,
        kind.event()
    )
}

/// Every binding line of `field`, in handler order.
pub fn bindings(field: &FieldDescriptor) -> Vec<String> {
    field.handlers().into_iter().map(|k| binding(field, k)).collect()
}

/// Empty handler method with a blank body line. `indent` prefixes every
/// non-blank line.
pub fn handler_stub(field: &FieldDescriptor, kind: HandlerKind, indent: &str) -> Vec<String> {
    vec![
        format!(
            "{indent}private void {}({})",
            kind.method_name(&field.name),
            kind.parameters()
        ),
        format!("{indent}{{"),
        String::new(),
        format!("{indent}}}"),
    ]
}

/// Handler stubs for every field, each followed by a blank line.
pub fn handler_stubs(fields: &[FieldDescriptor], indent: &str) -> Vec<String> {
    let mut out = Vec::new();
    for field in fields {
        for kind in field.handlers() {
            out.extend(handler_stub(field, kind, indent));
            out.push(String::new());
        }
    }
    out
}

/// Leading whitespace of `line`.
pub fn leading_indent(line: &str) -> &str {
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_line() {
        assert_eq!(
            declaration(&FieldDescriptor::new("Title", "TextMeshProUGUI")),
            "public TextMeshProUGUI Title;"
        );
    }

    #[test]
    fn button_binding() {
        let f = FieldDescriptor::new("Play", "Button");
        assert_eq!(bindings(&f), vec!["Play.onClick.AddListener(()=>OnPlayButtonClick());"]);
    }

    #[test]
    fn input_bindings_forward_value() {
        let f = FieldDescriptor::new("Name", "TMP_InputField");
        assert_eq!(
            bindings(&f),
            vec![
                "Name.onValueChanged.AddListener((value)=>OnNameInputChange(value));",
                "Name.onEndEdit.AddListener((value)=>OnNameInputEnd(value));",
            ]
        );
    }

    #[test]
    fn display_types_have_no_bindings() {
        assert!(bindings(&FieldDescriptor::new("Icon", "Image")).is_empty());
    }

    #[test]
    fn toggle_stub_shape() {
        let f = FieldDescriptor::new("Sound", "Toggle");
        assert_eq!(
            handler_stub(&f, HandlerKind::ToggleChange, "\t"),
            vec!["\tprivate void OnSoundToggleChange(bool value)", "\t{", "", "\t}"]
        );
    }

    #[test]
    fn stubs_are_separated_by_blank_lines() {
        let fields = vec![
            FieldDescriptor::new("A", "Button"),
            FieldDescriptor::new("B", "Text"),
            FieldDescriptor::new("C", "Toggle"),
        ];
        let stubs = handler_stubs(&fields, "");
        assert_eq!(stubs.len(), 10);
        assert_eq!(stubs[4], "");
        assert_eq!(stubs[5], "private void OnCToggleChange(bool value)");
        assert_eq!(stubs[9], "");
    }

    #[test]
    fn indent_of_anchor_lines() {
        assert_eq!(leading_indent("\t\t// anchor"), "\t\t");
        assert_eq!(leading_indent("x"), "");
        assert_eq!(leading_indent("    "), "    ");
    }
}
