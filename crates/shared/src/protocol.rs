use serde::{Deserialize, Serialize};

use crate::{
    domain::{Region, SubRegion},
    error::DirectoryError,
};

/// One entry of `GET /regions`. IBGE names the code field `sigla`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRecord {
    #[serde(alias = "sigla")]
    pub code: String,
}

/// One entry of `GET /regions/{code}/subregions`. IBGE names it `nome`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubRegionRecord {
    #[serde(alias = "nome")]
    pub name: String,
}

impl From<RegionRecord> for Region {
    fn from(value: RegionRecord) -> Self {
        Region(value.code)
    }
}

impl From<SubRegionRecord> for SubRegion {
    fn from(value: SubRegionRecord) -> Self {
        SubRegion(value.name)
    }
}

pub fn decode_regions(body: &[u8]) -> Result<Vec<Region>, DirectoryError> {
    let records: Vec<RegionRecord> = serde_json::from_slice(body)
        .map_err(|err| DirectoryError::decode(format!("invalid region list: {err}")))?;
    Ok(records.into_iter().map(Region::from).collect())
}

pub fn decode_sub_regions(body: &[u8]) -> Result<Vec<SubRegion>, DirectoryError> {
    let records: Vec<SubRegionRecord> = serde_json::from_slice(body)
        .map_err(|err| DirectoryError::decode(format!("invalid sub-region list: {err}")))?;
    Ok(records.into_iter().map(SubRegion::from).collect())
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
