//! Scripted stand-in for the host process, used by unit tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::ThingsClient;
use crate::executor::{ScriptOutput, ScriptRunner};
use crate::script::ScriptBuilder;

type Responder = Box<dyn Fn(&str) -> ScriptOutput + Send + Sync>;

/// Answers every script with a closure and records what it was asked to run
pub struct ScriptedRunner {
    respond: Responder,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new(respond: impl Fn(&str) -> ScriptOutput + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// A host that is already running; every other script goes to `respond`
    pub fn running(respond: impl Fn(&str) -> ScriptOutput + Send + Sync + 'static) -> Arc<Self> {
        Self::new(move |script| {
            if script.contains("System Events") {
                ScriptOutput::ok("true")
            } else {
                respond(script)
            }
        })
    }

    pub fn client(self: &Arc<Self>) -> ThingsClient {
        ThingsClient::new(self.clone(), ScriptBuilder::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Scripts other than the running probe
    pub fn host_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|script| !script.contains("System Events"))
            .collect()
    }
}

/// True for native batch scripts
pub fn is_batch(script: &str) -> bool {
    script.contains("resultTokens")
}

#[async_trait]
impl ScriptRunner for ScriptedRunner {
    async fn run(&self, script: &str) -> ScriptOutput {
        self.calls.lock().unwrap().push(script.to_string());
        (self.respond)(script)
    }

    fn timeout_secs(&self) -> u64 {
        30
    }
}
