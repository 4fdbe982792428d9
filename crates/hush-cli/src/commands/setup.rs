use anyhow::Result;
use hush_sdk::config::ForumConfig;
use hush_sdk::prove::setup_artifacts;

use crate::output;

/// Deterministic Groth16 setup for both circuits (seeded, not for
/// production ceremonies).
pub async fn run(config: &ForumConfig) -> Result<()> {
    let dir = config.artifacts_dir.clone();
    let sp = output::spinner("running circuit setup...");
    let written = tokio::task::spawn_blocking(move || setup_artifacts(&dir)).await?;
    sp.finish_and_clear();
    let written = written?;

    if output::is_json() {
        let files: Vec<_> = written
            .iter()
            .flat_map(|p| [p.proving_key.display().to_string(), p.verifying_key.display().to_string()])
            .collect();
        output::json_output(serde_json::json!({ "files": files }));
    } else {
        output::success("circuit artifacts written");
        for paths in &written {
            output::label("proving key", &paths.proving_key.display().to_string());
            output::label("verifying key", &paths.verifying_key.display().to_string());
        }
    }
    Ok(())
}
