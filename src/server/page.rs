//! Server-rendered HTML page.

use minijinja::Environment;
use serde::Serialize;

use crate::submission::Submission;

const PAGE_NAME: &str = "index.html";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Text Generation Web App</title>
</head>
<body>
  <h1>Text Generation Web App</h1>
  <form method="post" action="/">
    <input id="user_instruction" name="instruction" type="text" placeholder="Enter instruction..." value="{{ instruction }}">
    <input id="user_input" name="input" type="text" placeholder="Enter input..." value="{{ input }}">
    <input type="hidden" name="clicks" value="{{ clicks }}">
    <button id="submit_button" type="submit">Submit</button>
  </form>
  <h2>Answer:</h2>
  <p id="response">{% if answer is not none %}{{ answer }}{% endif %}</p>
  <p><small>{{ model }}</small></p>
</body>
</html>
"#;

#[derive(Serialize)]
struct PageView<'a> {
    instruction: &'a str,
    input: &'a str,
    clicks: u32,
    answer: Option<&'a str>,
    model: &'a str,
}

/// Renders the single page of the app.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    /// Compile the page template.
    ///
    /// # Errors
    /// Returns an error if the template does not parse.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(PAGE_NAME, PAGE_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the page for `submission` with the current `answer`.
    ///
    /// Field values and the answer are HTML-escaped.
    ///
    /// # Errors
    /// Returns an error if rendering fails.
    pub fn render(
        &self,
        submission: &Submission,
        answer: Option<&str>,
        model: &str,
    ) -> Result<String, minijinja::Error> {
        let view = PageView {
            instruction: submission.instruction.as_deref().unwrap_or_default(),
            input: submission.input.as_deref().unwrap_or_default(),
            clicks: submission.clicks,
            answer,
            model,
        };
        self.env.get_template(PAGE_NAME)?.render(view)
    }
}
