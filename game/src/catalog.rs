//! Loading and holding the immutable card pools.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use snafu::{ensure, OptionExt, ResultExt, Snafu};

/// The literal marker that introduces the card list inside an asset file.
pub const MARKER: &str = "cards=";

/// The separator token between two cards in an asset file.
pub const SEPARATOR: &str = "<>";

#[derive(Debug, Snafu)]
pub enum AssetError {
    #[snafu(display("card asset is missing the '{}' marker", MARKER))]
    MissingMarker,

    #[snafu(display("card asset contains no cards"))]
    NoCards,

    #[snafu(display("while reading card asset {}: {}", path.display(), source))]
    ReadAsset {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The immutable pool of prompt and response cards, loaded once at startup
/// and shared read-only by every round.
#[derive(Debug)]
pub struct CardCatalog {
    prompts: Vec<String>,
    responses: Vec<String>,
}

impl CardCatalog {
    /// Parse both card pools from their delimited text assets.
    ///
    /// Trailing periods are stripped from response cards so they splice
    /// cleanly into the middle of a prompt.
    pub fn load(prompt_asset: &str, response_asset: &str) -> Result<Self, AssetError> {
        let prompts = parse_cards(prompt_asset)?;
        let responses = parse_cards(response_asset)?
            .into_iter()
            .map(|card| card.trim_end_matches('.').to_string())
            .collect();
        Ok(CardCatalog { prompts, responses })
    }

    /// Read and parse both card pools from files on disk.
    pub fn from_files<P: AsRef<Path>>(prompts: P, responses: P) -> Result<Self, AssetError> {
        Self::load(&read_asset(prompts.as_ref())?, &read_asset(responses.as_ref())?)
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    /// Choose one prompt uniformly at random.
    pub fn pick_prompt<R: Rng>(&self, rng: &mut R) -> String {
        self.prompts
            .choose(rng)
            .expect("catalog holds at least one prompt")
            .clone()
    }

    /// A freshly shuffled clone of the response pool, for a new round to
    /// consume destructively. The template itself is never mutated.
    pub fn working_copy<R: Rng>(&self, rng: &mut R) -> Vec<String> {
        let mut copy = self.responses.clone();
        copy.shuffle(rng);
        copy
    }
}

fn parse_cards(asset: &str) -> Result<Vec<String>, AssetError> {
    let start = asset.find(MARKER).context(MissingMarker)?;
    let cards: Vec<String> = asset[start + MARKER.len()..]
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|card| !card.is_empty())
        .map(str::to_string)
        .collect();
    ensure!(!cards.is_empty(), NoCards);
    Ok(cards)
}

fn read_asset(path: &Path) -> Result<String, AssetError> {
    std::fs::read_to_string(path).context(ReadAsset {
        path: path.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn asset(cards: &[&str]) -> String {
        format!("cards={}", cards.join(SEPARATOR))
    }

    #[test]
    fn parses_delimited_assets() {
        let catalog = CardCatalog::load(
            &asset(&["Why? __________.", "__________ and __________."]),
            &asset(&["A sad trombone.", "Free hugs"]),
        )
        .unwrap();
        assert_eq!(
            catalog.prompts(),
            &["Why? __________.", "__________ and __________."]
        );
        // trailing periods stripped from responses only
        assert_eq!(catalog.responses(), &["A sad trombone", "Free hugs"]);
    }

    #[test]
    fn tolerates_text_before_the_marker_and_stray_separators() {
        let catalog = CardCatalog::load(
            "# comment line\ncards=One<>Two<>\n",
            &asset(&["Three", "Four"]),
        )
        .unwrap();
        assert_eq!(catalog.prompts(), &["One", "Two"]);
    }

    #[test]
    fn missing_marker_is_an_error() {
        let err = CardCatalog::load("One<>Two", &asset(&["Three"])).unwrap_err();
        assert!(matches!(err, AssetError::MissingMarker));
    }

    #[test]
    fn empty_card_list_is_an_error() {
        let err = CardCatalog::load(&asset(&["One"]), "cards= <> ").unwrap_err();
        assert!(matches!(err, AssetError::NoCards));
    }

    #[test]
    fn working_copy_is_a_permutation_and_leaves_the_template_alone() {
        let responses: Vec<String> = (0..30).map(|i| format!("card {}", i)).collect();
        let refs: Vec<&str> = responses.iter().map(String::as_str).collect();
        let catalog = CardCatalog::load(&asset(&["P __________."]), &asset(&refs)).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let copy = catalog.working_copy(&mut rng);
        assert_eq!(catalog.responses(), responses.as_slice());

        let mut sorted = copy.clone();
        sorted.sort();
        let mut expected = responses.clone();
        expected.sort();
        assert_eq!(sorted, expected);
    }
}
