use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    json_abi::{Function, JsonAbi},
    primitives::{keccak256, Bytes, B256},
};
use serde::Deserialize;

use crate::escrow::{EscrowParties, Role};

// Shape of a compiled artifact file, only the fields we consume
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    contract_name: String,
    abi: JsonAbi,
    bytecode: Bytes,
}

/// Compiled contract loaded through the registry
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    pub name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// First overload of the function called `name`
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.abi.function(name).and_then(|overloads| overloads.first())
    }

    pub fn bytecode_hash(&self) -> B256 {
        keccak256(&self.bytecode)
    }

    /// Make sure the constructor takes (supplier, distributor, carrier) addresses
    pub fn check_escrow_constructor(&self) -> eyre::Result<()> {
        let constructor = self
            .abi
            .constructor()
            .ok_or(eyre::eyre!("{} has no constructor in its abi", self.name))?;
        if constructor.inputs.len() != Role::ORDER.len() {
            return Err(eyre::eyre!(
                "{} constructor takes {} arguments, expected 3",
                self.name,
                constructor.inputs.len()
            ));
        }
        for (param, role) in constructor.inputs.iter().zip(Role::ORDER) {
            if param.ty != "address" {
                return Err(eyre::eyre!(
                    "{} constructor argument `{}` is `{}`, expected address",
                    self.name,
                    param.name,
                    param.ty
                ));
            }
            // unnamed parameters can only be checked by type
            let name = param.name.trim_start_matches('_');
            if !name.is_empty() && !name.eq_ignore_ascii_case(role.name()) {
                return Err(eyre::eyre!(
                    "{} constructor argument `{}` sits where {role} is expected",
                    self.name,
                    param.name
                ));
            }
        }
        Ok(())
    }

    pub fn creation_code(&self, parties: &EscrowParties) -> Bytes {
        [self.bytecode.to_vec(), parties.encode_constructor_args()]
            .concat()
            .into()
    }
}

/// Explicit lookup of compiled contracts by name
#[derive(Clone, Debug)]
pub struct ArtifactRegistry {
    dir: PathBuf,
}

impl ArtifactRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, contract_name: &str) -> PathBuf {
        self.dir.join(format!("{contract_name}.json"))
    }

    pub fn require(&self, contract_name: &str) -> eyre::Result<ContractArtifact> {
        let path = self.artifact_path(contract_name);
        let content = fs::read(&path)
            .map_err(|e| eyre::eyre!("{e}:{}", path.to_string_lossy()))?;
        let file: ArtifactFile = serde_json::from_slice(&content)
            .map_err(|e| eyre::eyre!("{e}:{}", path.to_string_lossy()))?;
        if file.contract_name != contract_name {
            return Err(eyre::eyre!(
                "artifact {} holds contract {}",
                path.to_string_lossy(),
                file.contract_name
            ));
        }
        if file.bytecode.is_empty() {
            return Err(eyre::eyre!(
                "{contract_name} has empty bytecode, is it an interface or abstract contract?"
            ));
        }
        Ok(ContractArtifact {
            name: file.contract_name,
            abi: file.abi,
            bytecode: file.bytecode,
        })
    }

    pub fn list(&self) -> eyre::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
