//! Cycle proof verification and the in-memory cycle solver.
//!
//! A proof is a strictly increasing list of edge nonces whose edges form a
//! single closed cycle of exactly `proof_size` edges in the keyed bipartite
//! graph, with the cycle hash additionally meeting the difficulty target.
//!
//! The solver computes edge endpoints in parallel, trims edges with a
//! degree-one endpoint (such edges cannot lie on a cycle), then runs a
//! union-find walk over the survivors: each edge joins two node trees, and
//! an edge landing inside one tree closes a cycle whose length is read off
//! the two root paths.

use std::collections::HashSet;

use tracing::debug;

use vine_core::constants::{MAX_EDGE_BITS, MIN_EDGE_BITS};
use vine_core::error::PowError;
use vine_core::hashing::sha256d;
use vine_core::types::Hash256;

use crate::siphash::{SipKeys, sip_node};

/// Union-find root paths longer than this abort the edge, not the solve.
const MAX_PATH_LEN: usize = 8192;

/// Hash of a cycle's nonces, serialized little-endian, for the difficulty
/// check.
pub fn cycle_hash(cycle: &[u32]) -> Hash256 {
    let mut data = Vec::with_capacity(cycle.len() * 4);
    for nonce in cycle {
        data.extend_from_slice(&nonce.to_le_bytes());
    }
    sha256d(&data)
}

/// Whether a cycle hash meets the difficulty target: its low 64 bits, read
/// little-endian, must not exceed the target.
pub fn meets_difficulty(hash: &Hash256, difficulty_target: u64) -> bool {
    let low: [u8; 8] = hash.as_bytes()[..8].try_into().expect("hash is 32 bytes");
    u64::from_le_bytes(low) <= difficulty_target
}

fn edge_mask(edge_bits: u8) -> Result<u64, PowError> {
    if !(MIN_EDGE_BITS..=MAX_EDGE_BITS).contains(&edge_bits) {
        return Err(PowError::BadEdgeBits(edge_bits));
    }
    Ok((1u64 << edge_bits) - 1)
}

/// Verify a full proof of work: cycle structure plus difficulty.
pub fn verify_proof_of_work(
    block_hash: &Hash256,
    difficulty_target: u64,
    edge_bits: u8,
    proof_size: usize,
    cycle: &[u32],
) -> Result<(), PowError> {
    let keys = SipKeys::from_hash(block_hash);
    verify_cycle(&keys, edge_bits, proof_size, cycle)?;
    if !meets_difficulty(&cycle_hash(cycle), difficulty_target) {
        return Err(PowError::DifficultyNotMet);
    }
    Ok(())
}

/// Verify that `cycle` is a single closed cycle of `proof_size` edges in
/// the graph keyed by `keys`.
pub fn verify_cycle(
    keys: &SipKeys,
    edge_bits: u8,
    proof_size: usize,
    cycle: &[u32],
) -> Result<(), PowError> {
    let mask = edge_mask(edge_bits)?;
    if cycle.len() != proof_size {
        return Err(PowError::WrongProofSize {
            got: cycle.len(),
            expected: proof_size,
        });
    }
    if proof_size < 2 {
        return Err(PowError::ShortCycle);
    }

    // Endpoint list: uvs[2n] is edge n's U node, uvs[2n+1] its V node.
    // A closed cycle visits every node an even number of times, so each
    // side's endpoints must cancel under xor.
    let mut uvs = vec![0u64; 2 * proof_size];
    let mut xor_u = 0u64;
    let mut xor_v = 0u64;
    for (n, &nonce) in cycle.iter().enumerate() {
        if u64::from(nonce) > mask {
            return Err(PowError::NonceTooBig(nonce));
        }
        if n > 0 && nonce <= cycle[n - 1] {
            return Err(PowError::NoncesOutOfOrder(n));
        }
        uvs[2 * n] = sip_node(keys, nonce, 0, mask);
        uvs[2 * n + 1] = sip_node(keys, nonce, 1, mask);
        xor_u ^= uvs[2 * n];
        xor_v ^= uvs[2 * n + 1];
    }
    if xor_u != 0 || xor_v != 0 {
        return Err(PowError::NonMatchingEdges);
    }

    // Walk the cycle: from each endpoint, exactly one other edge must
    // share its node on the same side. More than one is a branch, none is
    // a dead end; returning to the start early is a short cycle.
    let mut steps = 0usize;
    let mut i = 0usize;
    loop {
        let mut j = i;
        let mut k = i;
        loop {
            k = (k + 2) % (2 * proof_size);
            if k == i {
                break;
            }
            if uvs[k] == uvs[i] {
                if j != i {
                    return Err(PowError::Branch);
                }
                j = k;
            }
        }
        if j == i {
            return Err(PowError::DeadEnd);
        }
        i = j ^ 1;
        steps += 1;
        if i == 0 {
            break;
        }
    }
    if steps == proof_size {
        Ok(())
    } else {
        Err(PowError::ShortCycle)
    }
}

/// Search the graph keyed by `block_hash` for a proof-size cycle meeting
/// the difficulty target.
///
/// Returns `Ok(None)` when the graph holds no qualifying cycle; the caller
/// advances its header nonce and tries the next graph.
pub fn find_proof_of_work(
    block_hash: &Hash256,
    difficulty_target: u64,
    edge_bits: u8,
    proof_size: usize,
    threads: usize,
) -> Result<Option<Vec<u32>>, PowError> {
    let mask = edge_mask(edge_bits)?;
    let keys = SipKeys::from_hash(block_hash);

    let edges = compute_edges(&keys, edge_bits, mask, threads);
    let alive = trim_leaves(&edges, edge_bits);
    debug!(
        edge_bits,
        alive = alive.len(),
        trimmed = edges.len() - alive.len(),
        "edge trimming complete"
    );

    let Some(cycle) = find_cycle(&edges, &alive, edge_bits, proof_size) else {
        return Ok(None);
    };
    if verify_cycle(&keys, edge_bits, proof_size, &cycle).is_err() {
        return Ok(None);
    }
    if !meets_difficulty(&cycle_hash(&cycle), difficulty_target) {
        debug!("cycle found but difficulty target not met");
        return Ok(None);
    }
    Ok(Some(cycle))
}

/// Compute every edge's endpoints, splitting the nonce range across
/// `threads` workers.
fn compute_edges(keys: &SipKeys, edge_bits: u8, mask: u64, threads: usize) -> Vec<(u32, u32)> {
    let nedges = 1usize << edge_bits;
    let threads = threads.clamp(1, nedges);
    let keys = *keys;

    let mut edges = vec![(0u32, 0u32); nedges];
    let chunk = nedges.div_ceil(threads);
    std::thread::scope(|s| {
        for (t, slice) in edges.chunks_mut(chunk).enumerate() {
            let start = t * chunk;
            s.spawn(move || {
                for (i, e) in slice.iter_mut().enumerate() {
                    let nonce = (start + i) as u32;
                    *e = (
                        sip_node(&keys, nonce, 0, mask) as u32,
                        sip_node(&keys, nonce, 1, mask) as u32,
                    );
                }
            });
        }
    });
    edges
}

/// Repeatedly drop edges with a degree-one endpoint; cycle edges always
/// survive. Returns the surviving nonces in ascending order.
fn trim_leaves(edges: &[(u32, u32)], edge_bits: u8) -> Vec<u32> {
    let nedges = 1usize << edge_bits;
    let mut alive: Vec<u32> = (0..nedges as u32).collect();

    loop {
        let mut u_deg = vec![0u8; nedges];
        let mut v_deg = vec![0u8; nedges];
        for &n in &alive {
            let (u, v) = edges[n as usize];
            u_deg[u as usize] = u_deg[u as usize].saturating_add(1);
            v_deg[v as usize] = v_deg[v as usize].saturating_add(1);
        }

        let before = alive.len();
        alive.retain(|&n| {
            let (u, v) = edges[n as usize];
            u_deg[u as usize] >= 2 && v_deg[v as usize] >= 2
        });
        if alive.len() == before || alive.is_empty() {
            return alive;
        }
    }
}

/// Follow parent links from `node` to its tree root. Returns false when
/// the path exceeds [`MAX_PATH_LEN`].
fn path(cuckoo: &[u32], mut node: u32, buf: &mut Vec<u32>) -> bool {
    buf.clear();
    while node != 0 {
        if buf.len() >= MAX_PATH_LEN {
            return false;
        }
        buf.push(node);
        node = cuckoo[node as usize];
    }
    true
}

/// Union-find cycle search over the surviving edges.
///
/// Nodes are mapped into one space: U node `u` becomes `2u`, V node `v`
/// becomes `2v + 1`; node 0 is reserved as the nil parent, so edges whose
/// U node is 0 are skipped (a vanishing fraction of the edge space).
fn find_cycle(
    edges: &[(u32, u32)],
    alive: &[u32],
    edge_bits: u8,
    proof_size: usize,
) -> Option<Vec<u32>> {
    let nnodes = 2usize << edge_bits;
    let mut cuckoo = vec![0u32; nnodes + 1];
    let mut us: Vec<u32> = Vec::with_capacity(64);
    let mut vs: Vec<u32> = Vec::with_capacity(64);

    for &nonce in alive {
        let (un, vn) = edges[nonce as usize];
        let u0 = un << 1;
        let v0 = (vn << 1) | 1;
        if u0 == 0 {
            continue;
        }
        if !path(&cuckoo, u0, &mut us) || !path(&cuckoo, v0, &mut vs) {
            continue;
        }
        let nu = us.len() - 1;
        let nv = vs.len() - 1;

        if us[nu] == vs[nv] {
            // Both endpoints already share a tree: this edge closes a
            // cycle through the paths' first common node.
            let min = nu.min(nv);
            let (mut iu, mut iv) = (nu - min, nv - min);
            while us[iu] != vs[iv] {
                iu += 1;
                iv += 1;
            }
            let len = iu + iv + 1;
            debug!(len, "cycle closed");
            if len == proof_size {
                return Some(recover_cycle(edges, alive, &us, iu, &vs, iv));
            }
            continue;
        }

        // Different trees: reverse the shorter root path and hang it off
        // the other endpoint.
        if nu < nv {
            for k in (0..nu).rev() {
                cuckoo[us[k + 1] as usize] = us[k];
            }
            cuckoo[u0 as usize] = v0;
        } else {
            for k in (0..nv).rev() {
                cuckoo[vs[k + 1] as usize] = vs[k];
            }
            cuckoo[v0 as usize] = u0;
        }
    }
    None
}

/// Collect the nonces of the cycle's edges by re-walking the two root
/// paths and matching endpoint pairs against the surviving edges.
fn recover_cycle(
    edges: &[(u32, u32)],
    alive: &[u32],
    us: &[u32],
    nu: usize,
    vs: &[u32],
    nv: usize,
) -> Vec<u32> {
    // Path entries alternate sides: even positions hold U-space nodes,
    // odd positions V-space nodes. Each cycle edge is an (even, odd) pair.
    let mut cycle_edges: HashSet<(u32, u32)> = HashSet::new();
    cycle_edges.insert((us[0], vs[0]));
    let mut k = nu;
    while k > 0 {
        k -= 1;
        cycle_edges.insert((us[(k + 1) & !1], us[k | 1]));
    }
    let mut k = nv;
    while k > 0 {
        k -= 1;
        cycle_edges.insert((vs[k | 1], vs[(k + 1) & !1]));
    }

    let mut proof = Vec::with_capacity(cycle_edges.len());
    for &nonce in alive {
        let (un, vn) = edges[nonce as usize];
        if cycle_edges.remove(&(un << 1, (vn << 1) | 1)) {
            proof.push(nonce);
        }
    }
    proof
}
