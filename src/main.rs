use anyhow::Context;
use swarm_ngin::config::SwarmConfig;

fn main() -> anyhow::Result<()> {
    let mut config = SwarmConfig::default();
    if let Some(count) = std::env::args().nth(1) {
        config.object_count = count
            .parse()
            .with_context(|| format!("object count must be a number, got {:?}", count))?;
    }
    swarm_ngin::flow::run(config)
}
