// Solving a puzzle the way a participant would: from the published text and clue only.
// Nothing here sees a plaintext, it has to work it back out of the package.

use crate::core::cipher::{caesar_decrypt, vigenere_decrypt, CipherKind};
use crate::core::oracle::{Puzzle, PuzzleOracle};
use log::info;

/// Text between the first and last single quote
fn quoted(text: &str) -> Option<&str> {
    let start = text.find('\'')? + 1;
    let end = text.rfind('\'')?;
    (start <= end).then(|| &text[start..end])
}

fn caesar_shift(clue: &str) -> Option<u8> {
    clue.rsplit('=').next()?.trim().parse().ok()
}

/// Work out the answer to a published puzzle.
///
/// Proof-of-work puzzles are brute forced up to `max_nonce`. Returns `None`
/// for an exhausted hunt, an unreadable package or a search that ran out.
pub fn solve(puzzle: &Puzzle, max_nonce: u64) -> Option<String> {
    match puzzle {
        Puzzle::HashCommitment {
            cipher,
            puzzle: text,
            clue,
            ..
        } => {
            let ciphertext = quoted(text)?;
            let candidate = match cipher {
                CipherKind::Caesar => caesar_decrypt(ciphertext, caesar_shift(clue)?),
                CipherKind::Vigenere => vigenere_decrypt(ciphertext, quoted(clue)?),
            };
            puzzle.verify(&candidate).then_some(candidate)
        }
        Puzzle::ProofOfWork {
            prefix,
            required_zeros,
            ..
        } => {
            info!("Searching nonces up to {max_nonce} for {required_zeros} leading zeros");
            PuzzleOracle::solve_proof_of_work(prefix, *required_zeros, max_nonce)
                .map(|nonce| nonce.to_string())
        }
        Puzzle::Exhausted { .. } => None,
    }
}
