//! Round-robin pairing schedule.
//!
//! [`pairs_for_round`] is a pure function of population size and round
//! index. Each pair is reported as `(low, high)`; no agent appears twice in
//! one round.
//!
//! ```text
//! n even:  agent 0 fixed, ring [1, n) rotates one step per round
//!
//!            ring head
//!               │
//!      0 ───── r[h]        r[h+1] ── r[h-1]
//!                          r[h+2] ── r[h-2]   ...
//!
//! n odd:   agent s = round % n sits out,
//!          (s+i) mod n pairs with (s-i) mod n
//! ```
//!
//! Both layouts are the circle method: over one cycle (n - 1 rounds for even
//! n, n rounds for odd n) every agent meets every other agent exactly once.

/// Indices of two agents playing each other.
pub type Pair = (usize, usize);

/// Pairs playing in `round` for a population of `n`.
///
/// - `n < 2`: nobody plays.
/// - `n == 2`: the single pair every round.
/// - `n == 3`: agent `round % 3` sits out.
/// - even `n`: agent 0 meets the head of the ring `[1, n)` rotated by
///   `round % (n - 1)`; the rest of the ring pairs symmetrically around it.
/// - odd `n > 3`: agent `round % n` sits out; the others are paired the
///   same way around the sitting-out agent.
pub fn pairs_for_round(n: usize, round: u64) -> Vec<Pair> {
    match n {
        0 | 1 => Vec::new(),
        2 => vec![(0, 1)],
        3 => {
            let sitting_out = (round % 3) as usize;
            let playing: Vec<usize> = (0..3).filter(|&i| i != sitting_out).collect();
            vec![(playing[0], playing[1])]
        }
        n if n % 2 == 0 => even_rotation(n, round),
        n => odd_rotation(n, round),
    }
}

/// Number of rounds after which the schedule for `n` repeats.
pub fn cycle_length(n: usize) -> u64 {
    match n {
        0 | 1 => 1,
        n if n % 2 == 0 => (n - 1) as u64,
        n => n as u64,
    }
}

/// Agent sitting out in `round`, if any.
pub fn sitting_out(n: usize, round: u64) -> Option<usize> {
    if n >= 3 && n % 2 == 1 {
        Some((round % n as u64) as usize)
    } else {
        None
    }
}

fn ordered(a: usize, b: usize) -> Pair {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn even_rotation(n: usize, round: u64) -> Vec<Pair> {
    // Ring holds agents 1..n, so position p is agent p + 1
    let m = n - 1;
    let head = (round % m as u64) as usize;
    let at = |offset: usize| (head + offset) % m + 1;

    let mut pairs = Vec::with_capacity(n / 2);
    pairs.push((0, at(0)));
    for i in 1..=m / 2 {
        pairs.push(ordered(at(i), at(m - i)));
    }
    pairs
}

fn odd_rotation(n: usize, round: u64) -> Vec<Pair> {
    let s = (round % n as u64) as usize;

    let mut pairs = Vec::with_capacity(n / 2);
    for i in 1..=n / 2 {
        pairs.push(ordered((s + i) % n, (s + n - i) % n));
    }
    pairs
}
