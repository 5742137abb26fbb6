use clap::Parser;
use gempbot::cards::CardRegistry;
use gempbot::config::Config;
use gempbot::players;
use gempbot::workers::Worker;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    gempbot::log();
    gempbot::interrupts();
    let config = Config::parse();
    let registry = Arc::new(CardRegistry::load(&config.card_json_dir).expect("load card corpus"));
    let brain = players::build(&config.brain_name, &config);
    let (worker, _snapshots) = Worker::new(config, registry, brain);
    worker.run().await;
}
