use anyhow::Context;

use super::Globals;

pub fn run(globals: &Globals, port: Option<u16>, open: bool) -> anyhow::Result<()> {
    let (config, engine) = globals.engine()?;
    let port = port.unwrap_or(config.server.port);

    for w in config.validate() {
        tracing::warn!(level = ?w.level, "{}", w.message);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(rollup_server::serve(engine, port, open))
        .with_context(|| format!("server on port {port} stopped"))
}
