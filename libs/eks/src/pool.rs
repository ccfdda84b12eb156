//! Instance pools: weighted instance types usable interchangeably.
//!
//! A pool maps a grouping key to an ordered list of instance types. Order
//! matters: the provider prefers earlier entries when it must pick one.
//! Weights are capacity units passed through to the scaling group.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use instancemgr_api::InstanceTypeSpec;

/// Weight given to members of derived pools.
pub const DEFAULT_WEIGHT: &str = "1";

/// Kind of instance pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstancePoolType {
    /// Members share family, generation, size and architecture.
    SubFamilyFlexible,
}

impl InstancePoolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubFamilyFlexible => "SubFamilyFlexible",
        }
    }
}

impl fmt::Display for InstancePoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an instance pool type name that is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown instance pool type: {0}")]
pub struct UnknownInstancePoolType(pub String);

impl FromStr for InstancePoolType {
    type Err = UnknownInstancePoolType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SubFamilyFlexible" => Ok(Self::SubFamilyFlexible),
            other => Err(UnknownInstancePoolType(other.to_string())),
        }
    }
}

/// One member of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    #[serde(rename = "type")]
    pub type_: String,
    pub weight: String,
}

impl InstanceSpec {
    pub fn new(type_: &str, weight: &str) -> Self {
        Self {
            type_: type_.to_string(),
            weight: weight.to_string(),
        }
    }
}

impl From<&InstanceTypeSpec> for InstanceSpec {
    fn from(spec: &InstanceTypeSpec) -> Self {
        Self::new(&spec.type_, &spec.weight)
    }
}

/// Offering details of an EC2 instance type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceTypeInfo {
    pub instance_type: String,
    pub architectures: Vec<String>,
    pub vcpus: u32,
    pub memory_mib: u64,
    pub max_enis: u32,
    pub ipv4_per_eni: u32,
}

impl InstanceTypeInfo {
    pub fn supports_architecture(&self, arch: &str) -> bool {
        self.architectures.iter().any(|a| a == arch)
    }
}

/// A typed registry of pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancePool {
    #[serde(rename = "type")]
    pub type_: InstancePoolType,
    pub pool: BTreeMap<String, Vec<InstanceSpec>>,
}

impl InstancePool {
    pub fn new(type_: InstancePoolType) -> Self {
        Self {
            type_,
            pool: BTreeMap::new(),
        }
    }

    /// Exact-match lookup.
    ///
    /// `None` means the key was never declared; `Some(&[])` means it was
    /// declared with no members.
    pub fn get_pool(&self, key: &str) -> Option<&[InstanceSpec]> {
        self.pool.get(key).map(Vec::as_slice)
    }

    pub fn insert(&mut self, key: &str, specs: Vec<InstanceSpec>) {
        self.pool.insert(key.to_string(), specs);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pool.keys().map(String::as_str)
    }

    /// A pool keyed by `key` holding the explicitly listed types, in order.
    pub fn from_instance_types(
        type_: InstancePoolType,
        key: &str,
        instance_types: &[InstanceTypeSpec],
    ) -> Self {
        let mut pool = Self::new(type_);
        pool.insert(key, instance_types.iter().map(InstanceSpec::from).collect());
        pool
    }

    /// Derive a sub-family flexible pool from instance type offerings.
    ///
    /// Every offered type becomes a key. Its members are the offered types
    /// of the same family and generation (`c5`, `c5d`, `c5n`, ...) with the
    /// same size, vCPU count, memory and architectures. The key type comes
    /// first, the others sorted by name.
    pub fn sub_family_flexible(offerings: &[InstanceTypeInfo]) -> Self {
        let mut pool = Self::new(InstancePoolType::SubFamilyFlexible);

        for info in offerings {
            let Some(key) = SubFamily::parse(&info.instance_type) else {
                continue;
            };

            let mut siblings: Vec<&str> = offerings
                .iter()
                .filter(|other| other.instance_type != info.instance_type)
                .filter(|other| SubFamily::parse(&other.instance_type).as_ref() == Some(&key))
                .filter(|other| {
                    other.vcpus == info.vcpus
                        && other.memory_mib == info.memory_mib
                        && same_architectures(other, info)
                })
                .map(|other| other.instance_type.as_str())
                .collect();
            siblings.sort_unstable();
            siblings.dedup();

            let members = std::iter::once(info.instance_type.as_str())
                .chain(siblings)
                .map(|t| InstanceSpec::new(t, DEFAULT_WEIGHT))
                .collect();
            pool.insert(&info.instance_type, members);
        }

        pool
    }
}

fn same_architectures(a: &InstanceTypeInfo, b: &InstanceTypeInfo) -> bool {
    let mut left: Vec<&str> = a.architectures.iter().map(String::as_str).collect();
    let mut right: Vec<&str> = b.architectures.iter().map(String::as_str).collect();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}

/// Family, generation and size of an instance type, e.g. `c5` + `xlarge`
/// for `c5d.xlarge`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SubFamily<'a> {
    base: &'a str,
    size: &'a str,
}

impl<'a> SubFamily<'a> {
    fn parse(instance_type: &'a str) -> Option<Self> {
        let (class, size) = instance_type.split_once('.')?;
        if class.is_empty() || size.is_empty() {
            return None;
        }

        let letters = class
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(class.len());
        let digits = class[letters..]
            .find(|c: char| !c.is_ascii_digit())
            .map_or(class.len(), |i| letters + i);

        // No generation digits: the whole class is the family.
        let base = if digits == letters {
            class
        } else {
            &class[..digits]
        };
        Some(Self { base, size })
    }
}

/// Keep only offerings that support `arch`.
pub fn filter_architecture<'a>(
    offerings: &'a [InstanceTypeInfo],
    arch: &str,
) -> Vec<&'a InstanceTypeInfo> {
    offerings
        .iter()
        .filter(|info| info.supports_architecture(arch))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offering(instance_type: &str, arch: &str, vcpus: u32, memory_mib: u64) -> InstanceTypeInfo {
        InstanceTypeInfo {
            instance_type: instance_type.to_string(),
            architectures: vec![arch.to_string()],
            vcpus,
            memory_mib,
            max_enis: 4,
            ipv4_per_eni: 15,
        }
    }

    fn types(specs: &[InstanceSpec]) -> Vec<&str> {
        specs.iter().map(|s| s.type_.as_str()).collect()
    }

    #[test]
    fn test_get_pool_absent_vs_empty() {
        let mut pool = InstancePool::new(InstancePoolType::SubFamilyFlexible);
        assert_eq!(pool.get_pool("x86_64"), None);

        pool.insert("x86_64", vec![]);
        assert_eq!(pool.get_pool("x86_64"), Some(&[][..]));
    }

    #[test]
    fn test_get_pool_preserves_order() {
        let mut pool = InstancePool::new(InstancePoolType::SubFamilyFlexible);
        pool.insert(
            "m5.large",
            vec![InstanceSpec::new("m5.large", "2"), InstanceSpec::new("m5a.large", "1")],
        );
        let members = pool.get_pool("m5.large").unwrap();
        assert_eq!(types(members), vec!["m5.large", "m5a.large"]);
        assert_eq!(members[0].weight, "2");
        assert_eq!(pool.get_pool("M5.LARGE"), None);
    }

    #[test]
    fn test_sub_family_parse() {
        let parsed = SubFamily::parse("c5d.xlarge").unwrap();
        assert_eq!(parsed.base, "c5");
        assert_eq!(parsed.size, "xlarge");

        assert_eq!(SubFamily::parse("m6gd.large").unwrap().base, "m6");
        assert_eq!(SubFamily::parse("u-6tb1.metal").unwrap().base, "u-6tb1");
        assert!(SubFamily::parse("c5").is_none());
        assert!(SubFamily::parse(".large").is_none());
    }

    #[test]
    fn test_sub_family_flexible() {
        let offerings = vec![
            offering("c5n.xlarge", "x86_64", 4, 10752),
            offering("c5.xlarge", "x86_64", 4, 8192),
            offering("c5d.xlarge", "x86_64", 4, 8192),
            offering("c5a.xlarge", "x86_64", 4, 8192),
            offering("c5.2xlarge", "x86_64", 8, 16384),
            offering("c6g.xlarge", "arm64", 4, 8192),
            offering("c6i.xlarge", "x86_64", 4, 8192),
        ];

        let pool = InstancePool::sub_family_flexible(&offerings);
        assert_eq!(pool.type_, InstancePoolType::SubFamilyFlexible);

        assert_eq!(
            types(pool.get_pool("c5.xlarge").unwrap()),
            vec!["c5.xlarge", "c5a.xlarge", "c5d.xlarge"]
        );
        assert_eq!(
            types(pool.get_pool("c5d.xlarge").unwrap()),
            vec!["c5d.xlarge", "c5.xlarge", "c5a.xlarge"]
        );
        // Different memory, no siblings.
        assert_eq!(types(pool.get_pool("c5n.xlarge").unwrap()), vec!["c5n.xlarge"]);
        // Same generation, different architecture.
        assert_eq!(types(pool.get_pool("c6g.xlarge").unwrap()), vec!["c6g.xlarge"]);
        assert_eq!(types(pool.get_pool("c6i.xlarge").unwrap()), vec!["c6i.xlarge"]);
        assert!(pool
            .get_pool("c5.xlarge")
            .unwrap()
            .iter()
            .all(|s| s.weight == DEFAULT_WEIGHT));
    }

    #[test]
    fn test_from_instance_types() {
        let specs = vec![
            InstanceTypeSpec {
                type_: "m5.large".to_string(),
                weight: "2".to_string(),
            },
            InstanceTypeSpec {
                type_: "m5a.large".to_string(),
                weight: "1".to_string(),
            },
        ];
        let pool = InstancePool::from_instance_types(
            InstancePoolType::SubFamilyFlexible,
            "m5.large",
            &specs,
        );
        assert_eq!(
            pool.get_pool("m5.large").unwrap(),
            &[InstanceSpec::new("m5.large", "2"), InstanceSpec::new("m5a.large", "1")][..]
        );
    }

    #[test]
    fn test_filter_architecture() {
        let offerings = vec![
            offering("m6g.large", "arm64", 2, 8192),
            offering("m5.large", "x86_64", 2, 8192),
        ];
        let arm: Vec<&str> = filter_architecture(&offerings, "arm64")
            .iter()
            .map(|i| i.instance_type.as_str())
            .collect();
        assert_eq!(arm, vec!["m6g.large"]);
    }

    #[test]
    fn test_pool_type_parse() {
        assert_eq!(
            "SubFamilyFlexible".parse::<InstancePoolType>().unwrap(),
            InstancePoolType::SubFamilyFlexible
        );
        let err = "Other".parse::<InstancePoolType>().unwrap_err();
        assert_eq!(err, UnknownInstancePoolType("Other".to_string()));
        assert_eq!(err.to_string(), "unknown instance pool type: Other");
    }
}
