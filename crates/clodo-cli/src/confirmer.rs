//! The interactive half of `clodo_core::traits::Confirmer`. The
//! non-interactive half (`NonInteractiveConfirmer`, used under `--yes`
//! or when stdin isn't a tty) already lives in `clodo-core`.

use clodo_core::traits::Confirmer;
use dialoguer::Confirm;

pub struct InteractiveConfirmer;

impl Confirmer for InteractiveConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        Confirm::new().with_prompt(prompt).default(false).interact().unwrap_or(false)
    }
}
