//! PDF rasterization (part of C1, §4.1).

#[cfg(feature = "pdf")]
mod render;

#[cfg(feature = "pdf")]
pub use render::rasterize_pdf;

/// DPI ladder PDF rasterization retries before giving up (§4.1): 200 → 150 → 100.
pub const DPI_LADDER: [u32; 3] = [200, 150, 100];
