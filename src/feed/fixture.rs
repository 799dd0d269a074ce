use crate::feed::{FetchError, ReservationSource};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Static JSON file shipped with the board, addressed by a root-relative
/// path such as `/reservations.json`.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    pub fn new(fixture_dir: &Path, root_relative: &str) -> Self {
        Self {
            path: fixture_dir.join(root_relative.trim_start_matches('/')),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReservationSource for FixtureSource {
    async fn fetch(&self) -> Result<Value, FetchError> {
        let contents = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&contents)?)
    }

    fn describe(&self) -> String {
        format!("fixture {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn resolves_inside_fixture_dir() {
        let source = FixtureSource::new(Path::new("data"), "/feeds/today.json");
        assert_eq!(source.path(), Path::new("data/feeds/today.json"));
    }

    #[tokio::test]
    async fn bundled_fixture_is_an_array() -> Result<(), Box<dyn std::error::Error>> {
        let source = FixtureSource::new(Path::new("data"), "/reservations.json");

        let payload = source.fetch().await?;

        assert!(payload.as_array().is_some_and(|items| !items.is_empty()));
        Ok(())
    }

    #[tokio::test]
    async fn missing_fixture_is_io_error() {
        let source = FixtureSource::new(Path::new("data"), "/does-not-exist.json");

        let result = source.fetch().await;

        assert!(matches!(result, Err(FetchError::Io(_))));
    }

    #[tokio::test]
    async fn invalid_json_is_decode_error() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = std::env::temp_dir();
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let name = format!("charge-board-fixture-{unique}.json");
        fs::write(temp_dir.join(&name), "[{\"licensePlate\": ")?;

        let source = FixtureSource::new(&temp_dir, &format!("/{name}"));
        let result = source.fetch().await;
        let _ = fs::remove_file(temp_dir.join(&name));

        assert!(matches!(result, Err(FetchError::Decode(_))));
        Ok(())
    }
}
