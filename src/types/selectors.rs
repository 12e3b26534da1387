//! Well-known function selectors and event signatures.

use alloy_primitives::{B256, b256};

const METHODS: &[([u8; 4], &str)] = &[
    ([0xa9, 0x05, 0x9c, 0xbb], "transfer"),
    ([0x09, 0x5e, 0xa7, 0xb3], "approve"),
    ([0x23, 0xb8, 0x72, 0xdd], "transferFrom"),
    ([0x42, 0x84, 0x2e, 0x0e], "safeTransferFrom"),
    ([0x60, 0x80, 0x60, 0x40], "contractCreation"),
    ([0x7f, 0xf3, 0x6a, 0xb5], "swapETHForTokens"),
    ([0x18, 0xcb, 0xaf, 0xe5], "swapTokensForETH"),
    ([0xd0, 0xe3, 0x0d, 0xb0], "deposit"),
    ([0x2e, 0x1a, 0x7d, 0x4d], "withdraw"),
];

const EVENTS: &[(B256, &str)] = &[
    (super::event::TRANSFER_TOPIC, "Transfer"),
    (
        b256!("8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925"),
        "Approval",
    ),
    (
        b256!("d78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822"),
        "Swap",
    ),
];

/// Names the method a transaction calls.
///
/// Empty calldata is a plain value transfer.
#[must_use]
pub fn method_name(input: &[u8]) -> &'static str {
    if input.is_empty() {
        return "Transfer";
    }
    input
        .get(..4)
        .and_then(|selector| {
            METHODS
                .iter()
                .find(|(known, _)| known.as_slice() == selector)
                .map(|(_, name)| *name)
        })
        .unwrap_or("Unknown Method")
}

/// Names a log by its topic0.
#[must_use]
pub fn event_name(topic0: &B256) -> &'static str {
    EVENTS
        .iter()
        .find(|(sig, _)| sig == topic0)
        .map_or("Log Event", |(_, name)| *name)
}
