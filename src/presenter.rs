use std::io::{self, Write};

use tracing::warn;

use crate::orchestrator::AnalysisResult;

/// Where results and messages end up. Rendering never fails the request.
pub trait Presenter {
    fn present(&mut self, result: &AnalysisResult);
    fn present_error(&mut self, message: &str);
    fn present_warning(&mut self, message: &str);
    fn present_info(&mut self, message: &str);
    fn progress(&mut self, message: &str);
}

/// Result on `out`, everything else on `err`.
pub struct TerminalPresenter<W, E> {
    out: W,
    err: E,
}

impl TerminalPresenter<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<W: Write, E: Write> TerminalPresenter<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (W, E) {
        (self.out, self.err)
    }

    fn line(target: &mut dyn Write, text: &str) {
        if let Err(e) = writeln!(target, "{text}").and_then(|()| target.flush()) {
            warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W: Write, E: Write> Presenter for TerminalPresenter<W, E> {
    fn present(&mut self, result: &AnalysisResult) {
        Self::line(&mut self.out, &format!("\n## Analysis Result\n\n{}", result.content));
    }

    fn present_error(&mut self, message: &str) {
        Self::line(&mut self.err, &format!("error: {message}"));
    }

    fn present_warning(&mut self, message: &str) {
        Self::line(&mut self.err, &format!("warning: {message}"));
    }

    fn present_info(&mut self, message: &str) {
        Self::line(&mut self.err, message);
    }

    fn progress(&mut self, message: &str) {
        Self::line(&mut self.err, &format!("⏳ {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_goes_to_stdout_messages_to_stderr() {
        let mut presenter = TerminalPresenter::new(Vec::new(), Vec::new());
        presenter.present(&AnalysisResult {
            content: "**done**".into(),
        });
        presenter.present_warning("Please provide a query to analyze the video");
        presenter.present_error("boom");

        let (out, err) = presenter.into_inner();
        let out = String::from_utf8(out).unwrap();
        let err = String::from_utf8(err).unwrap();
        assert!(out.contains("## Analysis Result"));
        assert!(out.contains("**done**"));
        assert!(err.contains("warning: Please provide a query"));
        assert!(err.contains("error: boom"));
        assert!(!out.contains("boom"));
    }
}
