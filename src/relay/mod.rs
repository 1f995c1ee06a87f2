pub mod flashbots;
pub mod signer;
pub mod traits;

pub use flashbots::FlashbotsRelay;
pub use signer::WalletBundleSigner;
pub use traits::{BundleSigner, RelaySubmitter};
