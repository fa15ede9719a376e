use std::fmt::Display;

use alloy::{
    sol,
    sol_types::{SolConstructor, SolValue},
};
use eyre::WrapErr;

use crate::address::{parse_address, Address};

const ENCODED_ARGS_LENGTH: usize = 32 * 3;

sol! {
    /// Interface the escrow is deployed and read through
    contract Escrow {
        constructor(address supplier, address distributor, address carrier);
        function supplier() external view returns (address);
        function distributor() external view returns (address);
        function carrier() external view returns (address);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Role {
    Supplier,
    Distributor,
    Carrier,
}

impl Role {
    /// Order in which the escrow constructor takes its arguments
    pub const ORDER: [Role; 3] = [Role::Supplier, Role::Distributor, Role::Carrier];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Supplier => "supplier",
            Role::Distributor => "distributor",
            Role::Carrier => "carrier",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum EscrowError {
    #[error("{0} address must not be the zero address")]
    ZeroAddress(Role),
    #[error("{first} and {second} share the same address {address}")]
    DuplicateParty {
        first: Role,
        second: Role,
        address: Address,
    },
    #[error("constructor arguments must be {expected} bytes, found {found}")]
    BadArgumentsLength { expected: usize, found: usize },
    #[error("constructor arguments are not three padded addresses")]
    BadArguments,
}

/// The three accounts an escrow deployment is bound to
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EscrowParties {
    pub supplier: Address,
    pub distributor: Address,
    pub carrier: Address,
}

impl EscrowParties {
    pub fn new(
        supplier: Address,
        distributor: Address,
        carrier: Address,
    ) -> Result<Self, EscrowError> {
        let parties = EscrowParties {
            supplier,
            distributor,
            carrier,
        };
        for role in Role::ORDER {
            if parties.get(role).is_zero() {
                return Err(EscrowError::ZeroAddress(role));
            }
        }
        for (i, first) in Role::ORDER.iter().enumerate() {
            for second in &Role::ORDER[i + 1..] {
                let address = parties.get(*first);
                if address == parties.get(*second) {
                    return Err(EscrowError::DuplicateParty {
                        first: *first,
                        second: *second,
                        address,
                    });
                }
            }
        }
        Ok(parties)
    }

    pub fn parse(supplier: &str, distributor: &str, carrier: &str) -> eyre::Result<Self> {
        let parse_role = |role: Role, value: &str| -> eyre::Result<Address> {
            parse_address(value)
                .wrap_err_with(|| format!("invalid {role} address `{value}`"))
        };
        let parties = Self::new(
            parse_role(Role::Supplier, supplier)?,
            parse_role(Role::Distributor, distributor)?,
            parse_role(Role::Carrier, carrier)?,
        )?;
        Ok(parties)
    }

    pub fn get(&self, role: Role) -> Address {
        match role {
            Role::Supplier => self.supplier,
            Role::Distributor => self.distributor,
            Role::Carrier => self.carrier,
        }
    }

    pub fn constructor_args(&self) -> [Address; 3] {
        Role::ORDER.map(|role| self.get(role))
    }

    /// ABI-encode the constructor arguments in constructor order
    pub fn encode_constructor_args(&self) -> Vec<u8> {
        Escrow::constructorCall {
            supplier: self.supplier,
            distributor: self.distributor,
            carrier: self.carrier,
        }
        .abi_encode()
    }

    pub fn decode_constructor_args(data: &[u8]) -> eyre::Result<Self> {
        if data.len() != ENCODED_ARGS_LENGTH {
            return Err(EscrowError::BadArgumentsLength {
                expected: ENCODED_ARGS_LENGTH,
                found: data.len(),
            }
            .into());
        }
        let (supplier, distributor, carrier) =
            <(Address, Address, Address)>::abi_decode_validate(data)
                .map_err(|_| EscrowError::BadArguments)?;
        Ok(Self::new(supplier, distributor, carrier)?)
    }
}

/// A contract name paired with the constructor arguments it is deployed with
#[derive(Clone, Debug)]
pub struct DeploymentDescriptor {
    pub contract_name: String,
    pub parties: EscrowParties,
}
