//! Manifest loading.

use std::path::Path;

use anyhow::{bail, Context, Result};

use instancemgr_api::{InstanceGroup, KIND};
use instancemgr_eks::InstanceTypeInfo;

/// Parse an instance group from YAML or JSON.
pub fn parse(contents: &str) -> Result<InstanceGroup> {
    let instance_group: InstanceGroup =
        serde_yaml::from_str(contents).context("invalid instance group manifest")?;
    if instance_group.kind != KIND {
        bail!("expected kind {KIND}, got {:?}", instance_group.kind);
    }
    if instance_group.name().is_empty() {
        bail!("instance group manifest has no metadata.name");
    }
    Ok(instance_group)
}

pub fn load(path: &Path) -> Result<InstanceGroup> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    parse(&contents).with_context(|| format!("failed to load manifest: {}", path.display()))
}

/// Read a JSON array of instance type offerings.
pub fn load_offerings(path: &Path) -> Result<Vec<InstanceTypeInfo>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read offerings: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid offerings JSON: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MANIFEST: &str = r#"
apiVersion: instancemgr.keikoproj.io/v1alpha1
kind: InstanceGroup
metadata:
  name: workers-a
  namespace: kube-system
spec:
  provisioner: eks
  eks:
    minSize: 1
    maxSize: 3
    configuration:
      clusterName: prod
      image: ami-0123456789abcdef0
      instanceType: m5.large
"#;

    #[test]
    fn test_parse_manifest() {
        let ig = parse(MANIFEST).unwrap();
        assert_eq!(ig.namespaced_name().to_string(), "kube-system/workers-a");
        assert_eq!(ig.eks_configuration().cluster_name, "prod");
    }

    #[test]
    fn test_rejects_other_kinds() {
        let manifest = MANIFEST.replace("kind: InstanceGroup", "kind: Deployment");
        let err = parse(&manifest).unwrap_err();
        assert!(err.to_string().contains("expected kind"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let ig = load(file.path()).unwrap();
        assert_eq!(ig.name(), "workers-a");
    }

    #[test]
    fn test_load_offerings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"[{"instance_type":"m5.large","architectures":["x86_64"],"vcpus":2,"memory_mib":8192,"max_enis":3,"ipv4_per_eni":10}]"#,
        )
        .unwrap();

        let offerings = load_offerings(file.path()).unwrap();
        assert_eq!(offerings.len(), 1);
        assert_eq!(offerings[0].max_enis, 3);
    }
}
