use clap::Args;
use voice_agent::Selector;

#[derive(Args, Clone, Debug, Default)]
pub struct Targets {
    #[arg(short, long, help = "only affect the middleware service")]
    pub middleware: bool,
    #[arg(short, long, help = "only affect the UI service")]
    pub ui: bool,
    #[arg(short, long, help = "only affect the JADE platform")]
    pub jade: bool,
    #[arg(help = "service ids, every service when none are given")]
    pub services: Vec<String>,
}

impl Targets {
    pub fn selector(&self) -> Selector {
        let flags = [(self.middleware, "middleware"), (self.ui, "ui"), (self.jade, "jade")];
        let named = flags.into_iter().filter(|(set, _)| *set).map(|(_, id)| id.to_string());

        Selector::from_ids(named.chain(self.services.iter().cloned()))
    }
}
