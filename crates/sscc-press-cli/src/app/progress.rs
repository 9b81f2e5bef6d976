use sscc_press::{ProgressSink, Status};

/// Logs every status update.
///
/// Render progress is logged at most once per `step` completed labels, plus
/// the first and the last update.
#[derive(Clone, Copy, Debug)]
pub struct LogProgress {
    step: usize,
}

impl Default for LogProgress {
    fn default() -> Self {
        Self { step: 1 }
    }
}

impl LogProgress {
    pub fn every(step: usize) -> Self {
        Self { step: step.max(1) }
    }

    fn should_log(&self, status: &Status) -> bool {
        match status {
            Status::Rendering { done, total } => {
                *done == 0 || done == total || done % self.step == 0
            }
            _ => true,
        }
    }
}

impl ProgressSink for LogProgress {
    fn report(&mut self, status: Status) {
        if !self.should_log(&status) {
            return;
        }
        match status {
            Status::Failed { .. } => tracing::error!("{status}"),
            _ => tracing::info!("{status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_updates_are_thinned() {
        let progress = LogProgress::every(5);
        let logged: Vec<usize> = (0..=12)
            .filter(|&done| progress.should_log(&Status::Rendering { done, total: 12 }))
            .collect();
        assert_eq!(logged, vec![0, 5, 10, 12]);
    }

    #[test]
    fn stage_updates_always_log() {
        let progress = LogProgress::every(100);
        assert!(progress.should_log(&Status::Reading));
        assert!(progress.should_log(&Status::Assembling { pages: 3 }));
        assert!(progress.should_log(&Status::Failed {
            reason: "x".to_string()
        }));
    }

    #[test]
    fn zero_step_logs_everything() {
        let progress = LogProgress::every(0);
        assert!(progress.should_log(&Status::Rendering { done: 3, total: 7 }));
    }
}
