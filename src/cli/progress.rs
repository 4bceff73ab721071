use std::io::{self, Write};
use std::time::Instant;

use wfgen::contexts::StageObserver;
use wfgen::data::PipelineStage;

/// Prints each pipeline stage as it is entered
pub struct ProgressIndicator<W: Write> {
    out: W,
    start_time: Instant,
}

impl ProgressIndicator<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ProgressIndicator<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            start_time: Instant::now(),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StageObserver for ProgressIndicator<W> {
    fn enter(&mut self, stage: PipelineStage) {
        // Progress output is best effort
        let _ = match stage {
            PipelineStage::Start => writeln!(self.out, "Generating workflow script..."),
            PipelineStage::Done => writeln!(
                self.out,
                "✓ Finished in {:.2}s",
                self.start_time.elapsed().as_secs_f64()
            ),
            _ => writeln!(self.out, "  → {}", stage.label()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prints_each_stage() {
        let mut progress = ProgressIndicator::new(Vec::new());
        progress.enter(PipelineStage::Start);
        progress.enter(PipelineStage::Reason);
        progress.enter(PipelineStage::Done);

        let output = String::from_utf8(progress.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Generating workflow script...");
        assert_eq!(lines[1], "  → Reasoning about the request");
        assert!(lines[2].starts_with("✓ Finished in "));
    }
}
