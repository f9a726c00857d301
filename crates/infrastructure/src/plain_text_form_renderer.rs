use std::fmt::Write as _;

use formline_application::{FieldView, FormRenderer};
use formline_domain::{FieldControl, FieldOption, StagedFile, remote_ref_file_name};

/// Renders forms as indented plain text, one control per line.
#[derive(Debug, Default)]
pub struct PlainTextFormRenderer {
    output: String,
}

impl PlainTextFormRenderer {
    /// Creates a renderer with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rendered text and clears the buffer.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        let _ = writeln!(self.output, "{:indent$}{}", "", text.as_ref(), indent = indent * 2);
    }

    fn choices(&mut self, options: &[FieldOption], selected: &str, marker: (&str, &str)) {
        for option in options {
            let mark = if option.value() == selected {
                marker.1
            } else {
                marker.0
            };
            self.line(2, format!("{mark} {}", option.label().as_str()));
        }
    }
}

impl FormRenderer for PlainTextFormRenderer {
    fn success(&mut self, message: &str) {
        self.line(0, format!("[ok] {message}"));
    }

    fn form_errors(&mut self, messages: &[String]) {
        for message in messages {
            self.line(0, format!("[error] {message}"));
        }
    }

    fn heading(&mut self, label: &str) {
        self.line(0, format!("== {label} =="));
    }

    fn field(&mut self, view: &FieldView<'_>) {
        let config = view.config;
        let disabled = if config.disabled() { " (disabled)" } else { "" };

        match config.control() {
            FieldControl::Input { input_type } => {
                let shown = if input_type == "password" && !view.value.is_empty() {
                    "********".to_owned()
                } else if view.value.is_empty() {
                    config
                        .placeholder()
                        .map(|placeholder| format!("<{placeholder}>"))
                        .unwrap_or_default()
                } else {
                    view.value.to_owned()
                };
                self.line(
                    1,
                    format!("{} [{input_type}]{disabled}: {shown}", config.label()),
                );
            }
            FieldControl::Select { options } => {
                self.line(1, format!("{} [select]{disabled}:", config.label()));
                self.choices(options, view.value, ("  ", "->"));
            }
            FieldControl::Radio { options } => {
                self.line(1, format!("{} [radio]{disabled}:", config.label()));
                self.choices(options, view.value, ("( )", "(x)"));
            }
            FieldControl::TextArea => {
                self.line(1, format!("{} [textarea]{disabled}:", config.label()));
                for text in view.value.lines() {
                    self.line(2, format!("| {text}"));
                }
            }
        }

        if let Some(description) = config.description() {
            self.line(2, description);
        }
        for error in view.errors {
            self.line(2, format!("! {error}"));
        }
    }

    fn attachments(&mut self, files: &[StagedFile], remote_refs: &[String]) {
        self.line(0, format!("attachments ({})", files.len() + remote_refs.len()));
        for reference in remote_refs {
            self.line(1, format!("* {} (saved)", remote_ref_file_name(reference)));
        }
        for file in files {
            let kind = if file.is_image() { "image" } else { "file" };
            self.line(
                1,
                format!("+ {} ({kind}, {})", file.name(), file.size_label()),
            );
        }
    }

    fn submit_button(&mut self, label: &str, busy: bool) {
        let state = if busy { " (busy)" } else { "" };
        self.line(0, format!("[ {label} ]{state}"));
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use formline_application::{FieldView, FormRenderer};
    use formline_domain::{
        FieldConfig, FieldConfigInput, FieldKind, FieldOptionInput, OptionValueInput, StagedFile,
    };

    use super::PlainTextFormRenderer;

    fn config(name: &str, kind: FieldKind, options: Vec<FieldOptionInput>) -> FieldConfig {
        FieldConfig::new(FieldConfigInput {
            name: name.to_owned(),
            label: name.to_owned(),
            kind,
            options,
            placeholder: Some("type here".to_owned()),
            group: None,
            disabled: false,
            description: None,
        })
        .unwrap_or_else(|_| unreachable!())
    }

    fn option(value: &str, label: &str) -> FieldOptionInput {
        FieldOptionInput {
            value: OptionValueInput::Text(value.to_owned()),
            label: label.to_owned(),
        }
    }

    #[test]
    fn inputs_show_value_or_placeholder() {
        let title = config("title", FieldKind::Text, Vec::new());
        let secret = config("secret", FieldKind::Password, Vec::new());
        let mut renderer = PlainTextFormRenderer::new();

        renderer.field(&FieldView {
            config: &title,
            value: "",
            errors: &["required".to_owned()],
        });
        renderer.field(&FieldView {
            config: &secret,
            value: "hunter2",
            errors: &[],
        });

        assert_eq!(
            renderer.take_output(),
            "  title [text]: <type here>\n    ! required\n  secret [password]: ********\n"
        );
        assert!(renderer.take_output().is_empty());
    }

    #[test]
    fn choices_mark_the_selected_option() {
        let status = config(
            "status",
            FieldKind::Radio,
            vec![option("draft", "Draft"), option("live", "Live")],
        );
        let mut renderer = PlainTextFormRenderer::new();

        renderer.field(&FieldView {
            config: &status,
            value: "live",
            errors: &[],
        });

        assert_eq!(
            renderer.take_output(),
            "  status [radio]:\n    ( ) Draft\n    (x) Live\n"
        );
    }

    #[test]
    fn attachments_list_saved_and_staged_files() {
        let file = StagedFile::new("lamp.png", "image/png", Utc::now(), vec![0_u8; 1024 * 1024])
            .unwrap_or_else(|_| unreachable!());
        let mut renderer = PlainTextFormRenderer::new();

        renderer.attachments(&[file], &["uploads/2024/desk.jpg".to_owned()]);
        renderer.submit_button("Updating...", true);

        assert_eq!(
            renderer.take_output(),
            concat!(
                "attachments (2)\n",
                "  * desk.jpg (saved)\n",
                "  + lamp.png (image, 1.00 MB)\n",
                "[ Updating... ] (busy)\n",
            )
        );
    }
}
