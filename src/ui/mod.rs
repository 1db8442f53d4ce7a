//! Rendering only. Widgets read the session state and record what the user
//! asked for; `app` applies it.

pub mod panels;
pub mod plot;
pub mod tables;
pub mod viewer;

use crate::state::Action;

/// Side effects a widget asks the app to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ReloadCatalog,
    LoadDetectionFeed,
    OpenDetectionFile,
    UseSyntheticDetections,
}

/// Everything the user asked for during one frame.
#[derive(Debug, Default)]
pub struct Intents {
    pub actions: Vec<Action>,
    pub commands: Vec<Command>,
}

impl Intents {
    pub fn act(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn run(&mut self, command: Command) {
        self.commands.push(command);
    }
}
