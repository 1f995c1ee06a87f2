use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::{
    signers::{LocalWallet, Signer},
    types::{transaction::eip2718::TypedTransaction, Address, H256, U256},
    utils::keccak256,
};
use std::sync::Arc;
use tracing::debug;

use crate::{
    blockchain::ChainClient,
    relay::traits::BundleSigner,
    types::{Bundle, BundleEntry, SignedBundle},
};

pub struct WalletBundleSigner {
    wallet: LocalWallet,
    chain: Arc<dyn ChainClient>,
}

impl WalletBundleSigner {
    pub fn new(wallet: LocalWallet, chain_id: u64, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            wallet: wallet.with_chain_id(chain_id),
            chain,
        }
    }
}

#[async_trait]
impl BundleSigner for WalletBundleSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn sign_bundle(&self, bundle: &Bundle) -> Result<SignedBundle> {
        let signer = self.wallet.address();
        let first_nonce = self.chain.get_transaction_count(signer).await?;
        let mut nonce = first_nonce;

        let mut raw_transactions = Vec::with_capacity(bundle.entries().len());
        let mut tx_hashes = Vec::with_capacity(bundle.entries().len());

        for entry in bundle.entries() {
            let raw = match entry {
                BundleEntry::Signable {
                    signer: entry_signer,
                    transaction,
                } => {
                    if *entry_signer != signer {
                        return Err(anyhow!(
                            "Bundle leg expects signer {:?}, wallet is {:?}",
                            entry_signer,
                            signer
                        ));
                    }
                    let typed: TypedTransaction =
                        transaction.clone().from(signer).nonce(nonce).into();
                    let signature = self
                        .wallet
                        .sign_transaction_sync(&typed)
                        .map_err(|e| anyhow!("Failed to sign bundle leg: {}", e))?;
                    nonce += U256::one();
                    typed.rlp_signed(&signature)
                }
                BundleEntry::Raw(raw) => raw.clone(),
            };

            tx_hashes.push(H256::from(keccak256(&raw)));
            raw_transactions.push(raw);
        }

        debug!(
            "Signed bundle of {} transactions, nonces {}..{}",
            raw_transactions.len(),
            first_nonce,
            nonce
        );

        Ok(SignedBundle {
            raw_transactions,
            tx_hashes,
            signer,
            first_nonce,
        })
    }
}
