use super::Studio;
use crate::kernel::services::adapters::AppMessage;
use crate::kernel::services::ports::{ChatRole, ChatTurn};
use crate::kernel::{Action as KernelAction, Effect as KernelEffect};

impl Studio {
    pub fn dispatch(&mut self, action: KernelAction) -> bool {
        self.dispatch_kernel(action)
    }

    pub(super) fn dispatch_kernel(&mut self, action: KernelAction) -> bool {
        let result = self.store.dispatch(action);
        for effect in result.effects {
            self.run_effect(effect);
        }
        result.state_changed
    }

    fn run_effect(&mut self, effect: KernelEffect) {
        match effect {
            KernelEffect::Rebuild { snapshot } => {
                let generation = self.runtime.spawn_build(&self.pipeline, snapshot);
                self.builds_in_flight += 1;
                tracing::debug!(generation, "rebuild scheduled");
            }
            KernelEffect::Persist { session } => {
                self.runtime.spawn_persist(
                    self.storage.clone(),
                    self.config.autosave_key.clone(),
                    session,
                );
            }
            KernelEffect::Render(document) => {
                match self.sandbox.render(&document, &self.console_tx) {
                    Ok(report) => tracing::debug!(
                        generation = document.generation,
                        scripts = report.scripts_run,
                        "document rendered"
                    ),
                    Err(e) => tracing::error!(error = %e, "render failed"),
                }
            }
            KernelEffect::WriteDirectory { root, snapshot } => {
                self.runtime.save_dir(self.directory.clone(), root, snapshot);
            }
        }
    }

    pub fn handle_message(&mut self, msg: AppMessage) -> bool {
        match &msg {
            AppMessage::BuildFinished { .. } => {
                self.builds_in_flight = self.builds_in_flight.saturating_sub(1);
            }
            AppMessage::Edited(Ok(response)) => self.chat.push(ChatTurn {
                role: ChatRole::Assistant,
                text: response.summary.clone(),
            }),
            AppMessage::Persisted { key } => tracing::debug!(key = %key, "autosaved"),
            _ => {}
        }
        match msg.into_action() {
            Some(action) => self.dispatch_kernel(action),
            None => false,
        }
    }
}
