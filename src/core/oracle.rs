use crate::core::cipher::{caesar_encrypt, low_u64, vigenere_encrypt, word_from_seed, CipherKind};
use crate::error::{LedgerError, Result};
use crate::utils::sha256_hex;
use log::{debug, info};
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

// Puzzle tier constants
const CIPHER_TIER_MAX: u64 = 1500; // Substitution ciphers up to here
const PROOF_OF_WORK_TIER_MAX: u64 = 3301; // Hashing challenges up to here, then exhausted
const BASE_REQUIRED_ZEROS: usize = 3;
const ZEROS_STEP: u64 = 500; // One more leading zero every 500 difficulty levels
const SALT_MODULUS: u32 = 1_000_000;
const PREFIX_TAG: &str = "C3301-Block";

/// A puzzle package as embedded in an artifact block.
///
/// Hash-commitment puzzles only carry the hash of their answer, proof-of-work
/// puzzles are checked by recomputation, and `Exhausted` marks the end of the
/// hunt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Puzzle {
    #[serde(rename_all = "camelCase")]
    HashCommitment {
        cipher: CipherKind,
        puzzle: String,
        clue: String,
        solution_hash: String,
    },
    #[serde(rename_all = "camelCase")]
    ProofOfWork {
        prefix: String,
        required_zeros: usize,
        puzzle: String,
        clue: String,
    },
    Exhausted {
        puzzle: String,
        clue: String,
    },
}

impl Puzzle {
    pub fn verify(&self, proposed_solution: &str) -> bool {
        match self {
            Puzzle::HashCommitment { solution_hash, .. } => {
                sha256_hex(proposed_solution.as_bytes()) == *solution_hash
            }
            Puzzle::ProofOfWork {
                prefix,
                required_zeros,
                ..
            } => match proposed_solution.trim().parse::<BigInt>() {
                // Any integer counts, hashed in its canonical decimal form
                Ok(nonce) => PuzzleOracle::meets_target(prefix, &nonce, *required_zeros),
                Err(_) => {
                    debug!("Proof-of-work solution is not a nonce: {proposed_solution:?}");
                    false
                }
            },
            Puzzle::Exhausted { .. } => false,
        }
    }

    pub fn get_text(&self) -> &str {
        match self {
            Puzzle::HashCommitment { puzzle, .. }
            | Puzzle::ProofOfWork { puzzle, .. }
            | Puzzle::Exhausted { puzzle, .. } => puzzle,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Puzzle::Exhausted { .. })
    }
}

/// Stateless puzzle generator and verifier
pub struct PuzzleOracle;

impl PuzzleOracle {
    /// Derive the puzzle for `difficulty` from a hex `seed`, usually the previous block hash.
    pub fn create_puzzle(difficulty: u64, seed: &str) -> Result<Puzzle> {
        let seed_int = Self::parse_seed(seed)?;

        let puzzle = if difficulty <= CIPHER_TIER_MAX {
            if low_u64(&seed_int) % 2 == 0 {
                Self::caesar_puzzle(&seed_int)
            } else {
                Self::vigenere_puzzle(&seed_int)
            }
        } else if difficulty <= PROOF_OF_WORK_TIER_MAX {
            Self::hashing_challenge(&seed_int, difficulty)
        } else {
            Puzzle::Exhausted {
                puzzle: "All tokens have been discovered.".to_string(),
                clue: "The hunt is complete.".to_string(),
            }
        };

        info!(
            "Created {} puzzle at difficulty {difficulty}",
            match &puzzle {
                Puzzle::HashCommitment { cipher, .. } => format!("{cipher:?}"),
                Puzzle::ProofOfWork { required_zeros, .. } =>
                    format!("proof-of-work ({required_zeros} zeros)"),
                Puzzle::Exhausted { .. } => "terminal".to_string(),
            }
        );
        Ok(puzzle)
    }

    /// A proof-of-work puzzle with an explicit prefix and target
    pub fn proof_of_work(prefix: &str, required_zeros: usize) -> Puzzle {
        Puzzle::ProofOfWork {
            prefix: prefix.to_string(),
            required_zeros,
            puzzle: format!(
                "Find a number (nonce) such that the SHA-256 hash of '{prefix}{{nonce}}' starts with {required_zeros} zeros."
            ),
            clue: "This requires a brute-force script to solve. The solution is the nonce itself."
                .to_string(),
        }
    }

    pub fn required_zeros_for(difficulty: u64) -> usize {
        BASE_REQUIRED_ZEROS + (difficulty / ZEROS_STEP) as usize
    }

    pub fn leading_zeros(hash_hex: &str) -> usize {
        hash_hex.chars().take_while(|c| *c == '0').count()
    }

    fn meets_target(prefix: &str, nonce: impl std::fmt::Display, required_zeros: usize) -> bool {
        let hash = sha256_hex(format!("{prefix}{nonce}").as_bytes());
        Self::leading_zeros(&hash) >= required_zeros
    }

    /// Smallest nonce in `0..=max_nonce` that solves the challenge
    pub fn solve_proof_of_work(prefix: &str, required_zeros: usize, max_nonce: u64) -> Option<u64> {
        (0..=max_nonce).find(|nonce| Self::meets_target(prefix, nonce, required_zeros))
    }

    fn parse_seed(seed: &str) -> Result<BigUint> {
        if seed.is_empty() || !seed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerError::InvalidSeed(seed.to_string()));
        }
        BigUint::parse_bytes(seed.as_bytes(), 16)
            .ok_or_else(|| LedgerError::InvalidSeed(seed.to_string()))
    }

    fn caesar_puzzle(seed: &BigUint) -> Puzzle {
        let word = word_from_seed(seed, 7);
        let number = low_u64(&((seed >> 64usize) % 1000u32));
        let solution = format!("{word}{number}");
        let shift = (low_u64(&((seed >> 32usize) % 22u32)) + 3) as u8;

        let encrypted = caesar_encrypt(&solution, shift);
        Puzzle::HashCommitment {
            cipher: CipherKind::Caesar,
            puzzle: format!("Decrypt the following text: '{encrypted}'"),
            clue: format!("Caesar cipher, shift key = {shift}"),
            solution_hash: sha256_hex(solution.as_bytes()),
        }
    }

    fn vigenere_puzzle(seed: &BigUint) -> Puzzle {
        let word = word_from_seed(seed, 8);
        let keyword = word_from_seed(&(seed >> 64usize), 5);
        let number = low_u64(&((seed >> 128usize) % 1000u32));
        let solution = format!("{word}{number}");

        let encrypted = vigenere_encrypt(&solution, &keyword);
        Puzzle::HashCommitment {
            cipher: CipherKind::Vigenere,
            puzzle: format!("Decrypt the text using the keyword: '{encrypted}'"),
            clue: format!("Vigenère cipher, keyword = '{keyword}'"),
            solution_hash: sha256_hex(solution.as_bytes()),
        }
    }

    fn hashing_challenge(seed: &BigUint, difficulty: u64) -> Puzzle {
        let salt = low_u64(&(seed % SALT_MODULUS));
        let prefix = format!("{PREFIX_TAG}-{difficulty}-{salt}-");
        Self::proof_of_work(&prefix, Self::required_zeros_for(difficulty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::{caesar_decrypt, vigenere_decrypt};

    const EVEN_SEED: &str = "00000000000000000000000000000000000000000000000000000000000003e8";
    const ODD_SEED: &str = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

    // Pull the ciphertext out of "...: 'CIPHERTEXT'"
    fn ciphertext(puzzle: &Puzzle) -> String {
        let text = puzzle.get_text();
        let start = text.find('\'').unwrap() + 1;
        let end = text.rfind('\'').unwrap();
        text[start..end].to_string()
    }

    #[test]
    fn test_even_seed_gives_caesar() {
        let puzzle = PuzzleOracle::create_puzzle(1, EVEN_SEED).unwrap();
        match &puzzle {
            Puzzle::HashCommitment { cipher, clue, .. } => {
                assert_eq!(*cipher, CipherKind::Caesar);
                // (seed >> 32) % 22 + 3 with seed = 1000 -> 3
                assert_eq!(clue, "Caesar cipher, shift key = 3");
            }
            other => panic!("expected a cipher puzzle, got {other:?}"),
        }

        // 1000 -> letters: 1000 % 26 = 12 'M', 31 % 26 = 5 'F', then 'A's
        let plain = caesar_decrypt(&ciphertext(&puzzle), 3);
        assert_eq!(plain, "MFAAAAA0");
        assert!(puzzle.verify("MFAAAAA0"));
        assert!(!puzzle.verify("MFAAAAA1"));
    }

    #[test]
    fn test_odd_seed_gives_vigenere() {
        let puzzle = PuzzleOracle::create_puzzle(1500, ODD_SEED).unwrap();
        let keyword = match &puzzle {
            Puzzle::HashCommitment { cipher, clue, .. } => {
                assert_eq!(*cipher, CipherKind::Vigenere);
                clue.trim_start_matches("Vigenère cipher, keyword = '")
                    .trim_end_matches('\'')
                    .to_string()
            }
            other => panic!("expected a cipher puzzle, got {other:?}"),
        };
        assert_eq!(keyword.len(), 5);

        let plain = vigenere_decrypt(&ciphertext(&puzzle), &keyword);
        assert!(puzzle.verify(&plain));
    }

    #[test]
    fn test_package_never_contains_plaintext() {
        let puzzle = PuzzleOracle::create_puzzle(1, EVEN_SEED).unwrap();
        let package = serde_json::to_string(&puzzle).unwrap();
        assert!(!package.contains("MFAAAAA0"));
        assert!(package.contains("solutionHash"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let seed = sha256_hex(b"determinism");
        let first = PuzzleOracle::create_puzzle(7, &seed).unwrap();
        let second = PuzzleOracle::create_puzzle(7, &seed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mid_tier_gives_proof_of_work() {
        let puzzle = PuzzleOracle::create_puzzle(1501, EVEN_SEED).unwrap();
        match puzzle {
            Puzzle::ProofOfWork {
                prefix,
                required_zeros,
                ..
            } => {
                assert_eq!(prefix, "C3301-Block-1501-1000-");
                assert_eq!(required_zeros, 6);
            }
            other => panic!("expected proof of work, got {other:?}"),
        }
        assert_eq!(PuzzleOracle::required_zeros_for(3301), 9);
    }

    #[test]
    fn test_beyond_maximum_is_exhausted() {
        let puzzle = PuzzleOracle::create_puzzle(3302, EVEN_SEED).unwrap();
        assert!(puzzle.is_exhausted());
        assert!(!puzzle.verify(""));
        assert!(!puzzle.verify("anything"));
    }

    #[test]
    fn test_invalid_seed_rejected() {
        assert!(matches!(
            PuzzleOracle::create_puzzle(1, "not-hex"),
            Err(LedgerError::InvalidSeed(_))
        ));
        assert!(PuzzleOracle::create_puzzle(1, "").is_err());
        assert!(PuzzleOracle::create_puzzle(1, "12_34").is_err());
    }

    #[test]
    fn test_proof_of_work_smallest_nonce() {
        let puzzle = PuzzleOracle::proof_of_work("P-", 3);
        let nonce = PuzzleOracle::solve_proof_of_work("P-", 3, 10_000_000).unwrap();

        let hash = sha256_hex(format!("P-{nonce}").as_bytes());
        assert!(hash.starts_with("000"));
        for smaller in 0..nonce {
            assert!(!puzzle.verify(&smaller.to_string()));
        }
        assert!(puzzle.verify(&nonce.to_string()));
        assert!(puzzle.verify(&format!(" {nonce} ")));
    }

    #[test]
    fn test_proof_of_work_rejects_non_numeric() {
        let puzzle = PuzzleOracle::proof_of_work("P-", 0);
        assert!(puzzle.verify("17"));
        assert!(!puzzle.verify("seventeen"));
        assert!(!puzzle.verify("1.5"));
        assert!(!puzzle.verify(""));
    }

    #[test]
    fn test_proof_of_work_accepts_any_integer() {
        // Negative nonces hash with their sign, "P--<n>"
        let negative = (1..100_000i64)
            .map(|n| -n)
            .find(|n| sha256_hex(format!("P-{n}").as_bytes()).starts_with("00"))
            .unwrap();
        let puzzle = PuzzleOracle::proof_of_work("P-", 2);
        assert!(puzzle.verify(&negative.to_string()));

        let open = PuzzleOracle::proof_of_work("P-", 0);
        assert!(open.verify("-1"));
        assert!(open.verify("123456789012345678901234567890"));
        assert!(open.verify("+7"));
    }

    #[test]
    fn test_nonce_is_hashed_in_canonical_form() {
        // "007" is the nonce 7, so it solves exactly when "7" does
        let nonce = PuzzleOracle::solve_proof_of_work("P-", 2, 1_000_000).unwrap();
        let puzzle = PuzzleOracle::proof_of_work("P-", 2);
        assert!(puzzle.verify(&format!("00{nonce}")));
        assert!(puzzle.verify(&format!("+{nonce}")));
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(PuzzleOracle::leading_zeros("000abc"), 3);
        assert_eq!(PuzzleOracle::leading_zeros("a000"), 0);
        assert_eq!(PuzzleOracle::leading_zeros(""), 0);
    }
}
