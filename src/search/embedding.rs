//! Embedding seam and the default offline embedder
//!
//! [`Embedder`] is the boundary to whatever model turns text into vectors.
//! The only contract the index relies on is a constant output dimension.
//!
//! [`HtpEmbedder`] implements Harmonic Token Projection:
//! "Harmonic Token Projection: A Vocabulary-Free, Training-Free,
//!  Deterministic, and Reversible Embedding Methodology"
//! https://arxiv.org/html/2511.20665
//!
//! - No neural network required
//! - Deterministic (same input → same output)
//! - Unicode-based (multilingual support)

use std::f64::consts::PI;

use crate::error::Result;

/// Text → fixed-dimension vector
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output dimension; constant for the lifetime of the embedder
    fn dimension(&self) -> usize;

    /// Identifies the model in the build catalog
    fn name(&self) -> &str {
        "unnamed"
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Embedding dimension (2 * number of coprime moduli)
pub const EMBEDDING_DIM: usize = 384;

/// Number of coprime moduli for harmonic projection
const NUM_MODULI: usize = EMBEDDING_DIM / 2;

/// Maximum token length (Unicode code points)
const MAX_TOKEN_LENGTH: usize = 64;

/// First NUM_MODULI primes, pairwise coprime
static COPRIME_MODULI: &[u64] = &[
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
    73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151,
    157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229, 233,
    239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311, 313, 317,
    331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503,
    509, 521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607,
    613, 617, 619, 631, 641, 643, 647, 653, 659, 661, 673, 677, 683, 691, 701,
    709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797, 809, 811,
    821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911,
    919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997, 1009, 1013,
    1019, 1021, 1031, 1033, 1039, 1049, 1051, 1061, 1063, 1069, 1087, 1091,
    1093, 1097, 1103, 1109, 1117, 1123, 1129, 1151, 1153, 1163, 1171, 1181,
];

/// Deterministic Harmonic Token Projection embedder
#[derive(Debug, Clone)]
pub struct HtpEmbedder {
    moduli: Vec<u64>,
}

impl HtpEmbedder {
    pub fn new() -> Self {
        Self {
            moduli: COPRIME_MODULI[..NUM_MODULI].to_vec(),
        }
    }

    /// Embed a single token on the unit circle of each modulus
    ///
    /// The token is read as a base-2^16 integer N; for each modulus m_i the
    /// pair `[sin(2πr_i/m_i), cos(2πr_i/m_i)]` with `r_i = N mod m_i` is emitted.
    fn embed_token(&self, token: &str) -> Vec<f64> {
        let n = token_to_integer(token);

        let mut embedding = Vec::with_capacity(EMBEDDING_DIM);
        for &m in &self.moduli {
            let theta = 2.0 * PI * ((n % m) as f64) / (m as f64);
            embedding.push(theta.sin());
            embedding.push(theta.cos());
        }
        embedding
    }
}

impl Default for HtpEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HtpEmbedder {
    /// Mean of token embeddings, L2 normalized; all zeros for token-free text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Ok(vec![0.0; EMBEDDING_DIM]);
        }

        let mut sum = vec![0.0f64; EMBEDDING_DIM];
        for token in &tokens {
            for (acc, val) in sum.iter_mut().zip(self.embed_token(token)) {
                *acc += val;
            }
        }

        let count = tokens.len() as f64;
        for val in &mut sum {
            *val /= count;
        }

        let norm: f64 = sum.iter().map(|x| x * x).sum::<f64>().sqrt();
        let embedding = if norm > 0.0 {
            sum.iter().map(|x| (*x / norm) as f32).collect()
        } else {
            sum.iter().map(|x| *x as f32).collect()
        };

        Ok(embedding)
    }

    fn name(&self) -> &str {
        "htp-384"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// N = Σ u_j * B^(L-j) with B = 2^16, wrapping on overflow
fn token_to_integer(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_LENGTH)
        .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64))
}

/// Lowercased words split on whitespace and ASCII punctuation
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l2(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    #[test]
    fn test_htp_basic() {
        let model = HtpEmbedder::new();

        let emb1 = model.embed("hello world").unwrap();
        let emb2 = model.embed("hello world").unwrap();
        let emb3 = model.embed("goodbye moon").unwrap();

        assert_eq!(emb1, emb2);
        assert_ne!(emb1, emb3);
        assert_eq!(emb1.len(), model.dimension());
    }

    #[test]
    fn test_htp_deterministic_across_instances() {
        let text = "Storm batters the coast as residents evacuate";
        assert_eq!(
            HtpEmbedder::new().embed(text).unwrap(),
            HtpEmbedder::default().embed(text).unwrap()
        );
    }

    #[test]
    fn test_shared_tokens_are_closer() {
        let model = HtpEmbedder::new();
        let query = model.embed("election results").unwrap();
        let related = model.embed("the election results were announced").unwrap();
        let unrelated = model.embed("chocolate cake recipe").unwrap();

        assert!(l2(&query, &related) < l2(&query, &unrelated));
    }

    #[test]
    fn test_normalized_output() {
        let model = HtpEmbedder::new();
        for text in ["한국어 테스트", "Korean test"] {
            let emb = model.embed(text).unwrap();
            let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_no_tokens_embeds_to_zero() {
        let model = HtpEmbedder::new();
        let emb = model.embed("  ... ").unwrap();
        assert_eq!(emb.len(), EMBEDDING_DIM);
        assert!(emb.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Hello, World! it's"), vec!["hello", "world", "it", "s"]);
    }
}
