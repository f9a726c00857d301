use formline_domain::{FieldConfig, FieldSet, FormLayout, group_fields};

use crate::form_engine::FormSnapshot;
use crate::form_ports::{FieldView, FormRenderer};

/// Drives a renderer through one frame of a form.
///
/// Order: success banner, form-level errors, fields (flat or one heading per
/// group in first-appearance order), attachments when enabled, submit control.
pub fn render_form(snapshot: &FormSnapshot, fields: &FieldSet, renderer: &mut dyn FormRenderer) {
    if let Some(message) = snapshot.success_message.as_deref() {
        renderer.success(message);
    }

    let form_errors = snapshot.form_errors();
    if !form_errors.is_empty() {
        renderer.form_errors(form_errors);
    }

    match snapshot.layout {
        FormLayout::Single => {
            for field in fields.fields() {
                render_field(snapshot, field, renderer);
            }
        }
        FormLayout::Grouped => {
            for group in group_fields(fields.fields()).iter() {
                renderer.heading(group.label());
                for field in group.fields() {
                    render_field(snapshot, field, renderer);
                }
            }
        }
    }

    if snapshot.include_files {
        renderer.attachments(&snapshot.files, &snapshot.remote_refs);
    }

    renderer.submit_button(snapshot.submit_label, snapshot.is_pending());
}

fn render_field(snapshot: &FormSnapshot, field: &FieldConfig, renderer: &mut dyn FormRenderer) {
    renderer.field(&FieldView {
        config: field,
        value: snapshot.value(field.name()),
        errors: snapshot.field_errors(field.name()),
    });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use formline_domain::{
        FieldConfigInput, FieldErrors, FieldKind, FieldSet, FormLayout, StagedFile,
        SubmissionPhase, SubmissionResult,
    };

    use super::render_form;
    use crate::form_engine::FormSnapshot;
    use crate::form_ports::{FieldView, FormRenderer};

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Vec<String>,
    }

    impl FormRenderer for RecordingRenderer {
        fn success(&mut self, message: &str) {
            self.calls.push(format!("success:{message}"));
        }

        fn form_errors(&mut self, messages: &[String]) {
            self.calls.push(format!("form_errors:{}", messages.join("|")));
        }

        fn heading(&mut self, label: &str) {
            self.calls.push(format!("heading:{label}"));
        }

        fn field(&mut self, view: &FieldView<'_>) {
            self.calls.push(format!(
                "field:{}={}{}",
                view.config.name(),
                view.value,
                if view.errors.is_empty() {
                    String::new()
                } else {
                    format!(" !{}", view.errors.join("|"))
                }
            ));
        }

        fn attachments(&mut self, files: &[StagedFile], remote_refs: &[String]) {
            self.calls
                .push(format!("attachments:{}:{}", files.len(), remote_refs.join(",")));
        }

        fn submit_button(&mut self, label: &str, busy: bool) {
            self.calls.push(format!("submit:{label}:{busy}"));
        }
    }

    fn input(name: &str, group: Option<&str>) -> FieldConfigInput {
        FieldConfigInput {
            name: name.to_owned(),
            label: name.to_uppercase(),
            kind: FieldKind::Text,
            options: Vec::new(),
            placeholder: None,
            group: group.map(str::to_owned),
            disabled: false,
            description: None,
        }
    }

    fn fields() -> FieldSet {
        FieldSet::from_inputs(vec![
            input("title", Some("General")),
            input("price", Some("Pricing")),
            input("notes", Some("General")),
        ])
        .unwrap_or_else(|_| unreachable!())
    }

    fn snapshot(layout: FormLayout) -> FormSnapshot {
        FormSnapshot {
            phase: SubmissionPhase::Idle,
            layout,
            values: BTreeMap::from([("title".to_owned(), "Lamp".to_owned())]),
            result: SubmissionResult::Pending,
            success_message: None,
            include_files: false,
            files: Vec::new(),
            remote_refs: Vec::new(),
            submit_label: "Create",
        }
    }

    fn render(snapshot: &FormSnapshot) -> Vec<String> {
        let mut renderer = RecordingRenderer::default();
        render_form(snapshot, &fields(), &mut renderer);
        renderer.calls
    }

    #[test]
    fn grouped_layout_emits_headings_in_first_appearance_order() {
        assert_eq!(
            render(&snapshot(FormLayout::Grouped)),
            vec![
                "heading:General",
                "field:title=Lamp",
                "field:notes=",
                "heading:Pricing",
                "field:price=",
                "submit:Create:false",
            ]
        );
    }

    #[test]
    fn single_layout_keeps_declaration_order() {
        assert_eq!(
            render(&snapshot(FormLayout::Single)),
            vec![
                "field:title=Lamp",
                "field:price=",
                "field:notes=",
                "submit:Create:false",
            ]
        );
    }

    #[test]
    fn failed_snapshot_renders_errors_next_to_fields() {
        let mut failed = snapshot(FormLayout::Single);
        failed.phase = SubmissionPhase::Failed;
        failed.result = SubmissionResult::Failure {
            field_errors: FieldErrors::from([
                ("price".to_owned(), vec!["must be positive".to_owned()]),
                ("form".to_owned(), vec!["try again".to_owned()]),
            ]),
        };

        let calls = render(&failed);
        assert_eq!(calls[0], "form_errors:try again");
        assert!(calls.contains(&"field:price= !must be positive".to_owned()));
    }

    #[test]
    fn success_banner_attachments_and_busy_button() {
        let mut pending = snapshot(FormLayout::Single);
        pending.phase = SubmissionPhase::Pending;
        pending.submit_label = "Creating...";
        pending.include_files = true;
        pending.remote_refs = vec!["a.png".to_owned()];
        let calls = render(&pending);
        assert_eq!(
            calls[calls.len() - 2..],
            ["attachments:0:a.png", "submit:Creating...:true"]
        );

        let mut succeeded = snapshot(FormLayout::Single);
        succeeded.phase = SubmissionPhase::Succeeded;
        succeeded.success_message = Some("Saved".to_owned());
        assert_eq!(render(&succeeded)[0], "success:Saved");
    }
}
