use anyhow::{
    bail,
    Context as _,
    Result,
};
use tracing::{
    debug,
    info,
};

use crate::{
    config::Config,
    keystore::Keypair,
    rpc::{
        DryRunResponse,
        HttpTransport,
        ObjectChange,
        Owner,
        SuiClient,
        TransactionBlockResponse,
        TransactionEffects,
        Transport,
    },
    tx::{
        self,
        GasData,
        ReturnValues,
        TransactionBuilder,
        TransactionData,
    },
    Address,
    MoveCall,
    ObjectId,
};

pub mod marketplace;
pub mod nft;
pub mod streaming;
pub mod trading;

#[cfg(test)]
mod tests;


/// Everything a command needs: node access, deployment ids and the acting account
pub struct Context<T = HttpTransport> {
    pub client: SuiClient<T>,
    pub config: Config,
    signer: Option<Keypair>,
    account: Option<Address>,
    dry_run: bool,
}

impl Context {
    pub fn connect(config: Config, signer: Option<Keypair>) -> Result<Self> {
        let client = SuiClient::connect(&config.rpc_url, config.request_timeout()).context("Failed to create RPC client")?;
        Ok(Self::new(client, config, signer))
    }
}

impl<T: Transport> Context<T> {
    pub fn new(client: SuiClient<T>, config: Config, signer: Option<Keypair>) -> Self {
        let account = signer.as_ref().map(Keypair::address).or(config.address);
        Self {
            client,
            config,
            signer,
            account,
            dry_run: false,
        }
    }

    /// Simulate transactions instead of submitting them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool { self.dry_run }

    pub fn account(&self) -> Option<Address> { self.account }

    pub fn require_account(&self) -> Result<Address> {
        self.account
            .context("No account available; configure `address` or a keystore with an Ed25519 key")
    }

    /// Dev-inspects a single call and returns its values
    ///
    /// The sender is the configured account, or the zero address without one
    pub fn inspect<C: MoveCall>(&self, package: ObjectId, call: &C) -> Result<ReturnValues> {
        let mut builder = TransactionBuilder::new();
        builder.move_call(package, call)?;
        let kind = builder.inspect_kind(&self.client)?;
        let results = self
            .client
            .dev_inspect(self.account.unwrap_or(Address::ZERO), &kind)
            .with_context(|| format!("Failed to inspect {}::{}", C::MODULE, C::FUNCTION))?;
        Ok(ReturnValues::from_results(results).with_context(|| format!("{}::{} aborted", C::MODULE, C::FUNCTION))?)
    }

    /// Builds, signs and submits a single call
    pub fn call<C: MoveCall>(&self, package: ObjectId, call: &C) -> Result<Outcome> {
        let mut builder = TransactionBuilder::new();
        builder.move_call(package, call)?;
        self.execute(&builder)
    }

    /// Resolves inputs and gas, then submits and waits for confirmation, or dry-runs when so configured
    pub fn execute(&self, builder: &TransactionBuilder) -> Result<Outcome> {
        if builder.is_empty() {
            bail!("Nothing to submit");
        }
        let sender = match (&self.signer, self.dry_run) {
            (Some(signer), _) => signer.address(),
            (None, true) => self.require_account()?,
            (None, false) => bail!("A signing key is required to submit transactions"),
        };

        let kind = builder.resolve(&self.client).context("Failed to resolve transaction inputs")?;
        let price = self.client.get_reference_gas_price()?;
        let budget = self.config.gas_budget;
        let payment = tx::select_gas(&self.client, sender, budget.saturating_add(builder.gas_spend()))?;
        let data = TransactionData::new(kind, sender, GasData {
            payment,
            owner: sender,
            price,
            budget,
        });
        let bytes = bcs::to_bytes(&data)?;
        debug!(%sender, price, budget, size = bytes.len(), "transaction built");

        let signer = match &self.signer {
            Some(signer) if !self.dry_run => signer,
            _ => {
                let response = self.client.dry_run(&bytes).context("Dry run failed")?;
                response.effects.status.check()?;
                info!("Dry run succeeded");
                return Ok(Outcome::Simulated(response));
            },
        };

        let signature = signer.sign_transaction(&bytes);
        let response = self.client.execute(&bytes, &signature).context("Failed to submit transaction")?;
        info!(digest = %response.digest, "Transaction submitted");

        let confirmed = self
            .client
            .wait_for_transaction(&response.digest, self.config.confirm_timeout(), self.config.poll_interval())
            .with_context(|| format!("Transaction {} was not confirmed", response.digest))?;
        confirmed
            .effects
            .as_ref()
            .context("Transaction response has no effects")?
            .status
            .check()?;
        Ok(Outcome::Executed(confirmed))
    }
}


#[derive(Debug)]
pub enum Outcome {
    Executed(TransactionBlockResponse),
    Simulated(DryRunResponse),
}

impl Outcome {
    pub fn digest(&self) -> Option<&str> {
        match self {
            Self::Executed(tx) => Some(&tx.digest),
            Self::Simulated(_) => None,
        }
    }

    pub fn is_simulated(&self) -> bool { matches!(self, Self::Simulated(_)) }

    fn effects(&self) -> Option<&TransactionEffects> {
        match self {
            Self::Executed(tx) => tx.effects.as_ref(),
            Self::Simulated(dry) => Some(&dry.effects),
        }
    }

    /// First object created into an account, e.g. a freshly minted NFT
    pub fn created_owned(&self) -> Option<ObjectId> {
        self.effects()?
            .created
            .iter()
            .find(|c| matches!(c.owner, Owner::AddressOwner(_)))
            .map(|c| c.reference.object_id)
    }

    /// Id of a created object whose type contains `type_fragment`
    pub fn created_of_type(&self, type_fragment: &str) -> Option<ObjectId> {
        let Self::Executed(tx) = self else { return None };
        tx.object_changes.iter().find_map(|change| match change {
            ObjectChange::Created { object_id, object_type, .. } if object_type.contains(type_fragment) => Some(*object_id),
            _ => None,
        })
    }
}


/// Rejects empty form values
pub(crate) fn require_filled(values: &[&str]) -> Result<()> {
    if values.iter().any(|v| v.trim().is_empty()) {
        bail!("Please fill all fields");
    }
    Ok(())
}

/// Case-insensitive substring match over any of `fields`; an empty query matches everything
pub fn matches_query<'a>(query: &str, fields: impl IntoIterator<Item = &'a str>) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty() || fields.into_iter().any(|f| f.to_lowercase().contains(&query))
}
