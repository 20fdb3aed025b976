//! Test doubles shared by the unit tests

use crate::runner::{CommandRunner, ProcessOutput};
use crate::sink::{OutputSink, Stage};
use crate::tools::Invocation;
use std::collections::VecDeque;
use std::io;

/// Replays scripted exit codes and records every invocation
#[derive(Default)]
pub struct ScriptedRunner {
    pub invocations: Vec<Invocation>,
    results: VecDeque<(i32, Vec<&'static str>)>,
}

impl ScriptedRunner {
    /// Every invocation succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next unscripted invocation
    pub fn then(mut self, code: i32, lines: &[&'static str]) -> Self {
        self.results.push_back((code, lines.to_vec()));
        self
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &mut self,
        invocation: &Invocation,
        on_line: &mut dyn FnMut(&str),
    ) -> io::Result<ProcessOutput> {
        self.invocations.push(invocation.clone());
        let (code, lines) = self.results.pop_front().unwrap_or((0, vec!["ok"]));
        for line in &lines {
            on_line(line);
        }
        Ok(ProcessOutput {
            success: code == 0,
            code: Some(code),
            output: lines.join("\n"),
        })
    }
}

/// Collects everything the sequencer reports
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<String>,
}

impl OutputSink for RecordingSink {
    fn stage_started(&mut self, stage: Stage, _invocation: &Invocation) {
        self.events.push(format!("start {}", stage));
    }

    fn output_line(&mut self, stage: Stage, line: &str) {
        self.events.push(format!("{}: {}", stage, line));
    }

    fn stage_finished(&mut self, stage: Stage, success: bool) {
        self.events.push(format!("finish {} {}", stage, success));
    }
}
