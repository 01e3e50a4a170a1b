//! Response composition. Pure: no calls, no retries, order preserved.

use wayfarer_config::ResponseConfig;
use wayfarer_core::{Domain, FailureKind, StepAction, StepOutcome, StepResult};

pub struct Composer {
    divider: String,
    disclaimer: Option<String>,
}

impl Composer {
    pub fn new(divider_width: usize, disclaimer: Option<String>) -> Self {
        Self {
            divider: "=".repeat(divider_width),
            disclaimer,
        }
    }

    pub fn from_config(config: &ResponseConfig) -> Self {
        Self::new(config.divider_width, config.disclaimer.clone())
    }

    /// One block per result, in the order given.
    pub fn compose(&self, results: &[StepResult]) -> String {
        let separator = format!("\n\n{}\n\n", self.divider);
        let mut out = results
            .iter()
            .map(render)
            .collect::<Vec<_>>()
            .join(&separator);

        if let Some(disclaimer) = &self.disclaimer {
            out.push_str(&separator);
            out.push_str(disclaimer);
        }
        out
    }

    /// Shown when a request matched nothing.
    pub fn help(&self, served: &[Domain]) -> String {
        if served.is_empty() {
            return "Sorry, no travel services are connected right now. Please try again later."
                .to_string();
        }
        let mut out = String::from("I'm not sure what you need. Here is what I can help with:");
        for domain in served {
            let example = match domain {
                Domain::Train => "Trains: \"Find trains from Leeds to Manchester today\"",
                Domain::Hotel => "Hotels: \"Find hotels in Paris for December 20-22\"",
                Domain::Utility => "Utilities: \"Calculate 15 * 7 + 3\"",
            };
            out.push_str("\n• ");
            out.push_str(example);
        }
        out
    }
}

fn render(result: &StepResult) -> String {
    let label = &result.step.label;
    let body = match (&result.outcome, &result.step.action) {
        (StepOutcome::Success(text), _) => text.clone(),
        (StepOutcome::Failed(f), StepAction::Unavailable { domain })
            if f.kind == FailureKind::NoMatchingCapability =>
        {
            format!("No {domain} capability is available right now.")
        }
        (StepOutcome::Failed(f), _) => format!(
            "Sorry, I could not retrieve {}: {}",
            label.to_lowercase(),
            f.reason
        ),
    };
    format!("{label}:\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core::{OrchestrationStep, StepFailure};

    fn ok(label: &str, text: &str) -> StepResult {
        StepResult::success(OrchestrationStep::note(label, text), text)
    }

    #[test]
    fn blocks_are_joined_by_the_divider() {
        let composer = Composer::new(5, None);
        let out = composer.compose(&[ok("TRAIN OPTIONS", "08:15 Leeds"), ok("HOTEL OPTIONS", "Ibis")]);
        assert_eq!(out, "TRAIN OPTIONS:\n08:15 Leeds\n\n=====\n\nHOTEL OPTIONS:\nIbis");
    }

    #[test]
    fn failures_apologise_in_place() {
        let composer = Composer::new(3, None);
        let failed = StepResult::failed(
            OrchestrationStep::invoke("ACCOMMODATION", "multi_hotels.search_hotels", Default::default()),
            StepFailure::new(FailureKind::WorkerTimeout, "the multi_hotels service did not respond within 1.5s"),
        );
        let out = composer.compose(&[
            ok("OUTBOUND JOURNEY (2025-12-15)", "a"),
            failed,
            ok("RETURN JOURNEY (2025-12-16)", "b"),
        ]);
        let blocks: Vec<&str> = out.split("\n\n===\n\n").collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[1],
            "ACCOMMODATION:\nSorry, I could not retrieve accommodation: the multi_hotels service did not respond within 1.5s"
        );
        assert!(blocks[2].starts_with("RETURN JOURNEY"));
    }

    #[test]
    fn missing_domain_is_named() {
        let step = OrchestrationStep::unavailable("HOTEL OPTIONS", Domain::Hotel);
        let result = StepResult::failed(
            step,
            StepFailure::new(FailureKind::NoMatchingCapability, "no hotel capability"),
        );
        assert_eq!(
            Composer::new(3, None).compose(&[result]),
            "HOTEL OPTIONS:\nNo hotel capability is available right now."
        );
    }

    #[test]
    fn disclaimer_goes_after_a_final_divider() {
        let composer = Composer::new(2, Some("Sample data only.".into()));
        assert_eq!(
            composer.compose(&[ok("RESULT", "42")]),
            "RESULT:\n42\n\n==\n\nSample data only."
        );
    }

    #[test]
    fn help_lists_served_domains() {
        let composer = Composer::from_config(&ResponseConfig::default());
        let help = composer.help(&[Domain::Train, Domain::Utility]);
        assert!(help.contains("Trains:"));
        assert!(help.contains("Utilities:"));
        assert!(!help.contains("Hotels:"));
        assert!(composer.help(&[]).contains("no travel services"));
    }
}
