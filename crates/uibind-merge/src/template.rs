//! First-generation template: the complete panel class written when no
//! target file exists yet.

use uibind_types::{unique_by_name, Document, FieldDescriptor, GeneratorConfig, Line};

use crate::render;

/// Render the initial panel class for `class_name`. Carries no markers.
///
/// `generated_at` is written verbatim into the header comment.
pub fn render_template(
    class_name: &str,
    fields: &[FieldDescriptor],
    config: &GeneratorConfig,
    generated_at: &str,
) -> Document {
    let fields = unique_by_name(fields);
    let unit = config.indent.as_str();
    let outer = if config.namespace.is_some() { unit } else { "" };
    let member = format!("{outer}{unit}");
    let body = format!("{member}{unit}");
    let lc = &config.lifecycle;

    let mut out: Vec<String> = vec![
        "/*----------------------------------".into(),
        " *Title: UI panel component bindings (generated by uibind)".into(),
        format!(" *Date: {generated_at}"),
        " *Description: tag child nodes as [Type]Name, then regenerate this panel".into(),
        " *Note: generated content is only appended or marked for removal; hand-written logic is kept".into(),
        "----------------------------------*/".into(),
        "using UnityEngine;".into(),
        "using UnityEngine.UI;".into(),
        "using TMPro;".into(),
        String::new(),
    ];

    if let Some(ns) = &config.namespace {
        out.push(format!("namespace {ns}"));
        out.push("{".into());
        out.push(String::new());
    }

    out.push(format!("{outer}public class {class_name} : {}", config.base_class));
    out.push(format!("{outer}{{"));

    out.push(format!("{member}// Field declarations"));
    out.extend(fields.iter().map(|f| format!("{member}{}", render::declaration(f))));
    out.push(format!("{member}{}", config.anchors.field));
    out.push(format!("{member}// Hand-written fields below are kept"));
    out.push(String::new());

    out.push(format!("{member}protected override void {}()", lc.init_method));
    out.push(format!("{member}{{"));
    out.push(format!("{body}base.{}();", lc.init_method));
    out.push(format!("{body}// Hand-written {} logic is kept", lc.init_method));
    out.push(format!("{member}}}"));
    out.push(String::new());

    out.push(format!("{member}protected override void {}()", lc.binding_method));
    out.push(format!("{member}{{"));
    out.push(format!("{body}base.{}();", lc.binding_method));
    out.push(format!("{body}// Event bindings"));
    out.extend(
        fields
            .iter()
            .flat_map(render::bindings)
            .map(|b| format!("{body}{b}")),
    );
    out.push(format!("{body}{}", config.anchors.binding));
    out.push(format!("{body}// Hand-written {} logic is kept", lc.binding_method));
    out.push(format!("{member}}}"));
    out.push(String::new());

    for method in [&lc.show_method, &lc.hide_method] {
        out.push(format!("{member}public override void {method}()"));
        out.push(format!("{member}{{"));
        out.push(format!("{body}// Hand-written {method} logic is kept"));
        out.push(format!("{member}}}"));
        out.push(String::new());
    }

    out.extend(render::handler_stubs(&fields, &member));
    out.push(format!("{member}{}", config.anchors.handler));
    out.push(format!("{member}// Hand-written content"));
    out.push(format!("{outer}}}"));

    if config.namespace.is_some() {
        out.push("}".into());
    }

    out.into_iter().map(Line::new).collect()
}
