use semver::Version;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Identifies an EKS cluster. Names are only unique within a region.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ClusterRef {
    pub name: String,
    pub region: String,
}

impl ClusterRef {
    pub fn new<S1, S2>(name: S1, region: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        ClusterRef {
            name: name.into(),
            region: region.into(),
        }
    }
}

impl Display for ClusterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.name)
    }
}

/// The Kubernetes `major.minor` version reported by the EKS control plane.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClusterVersion(Version);

impl ClusterVersion {
    pub fn new(major: u64, minor: u64) -> Self {
        ClusterVersion(Version::new(major, minor, 0))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }
}

impl FromStr for ClusterVersion {
    type Err = error::Error;

    /// EKS reports versions like `1.28`; a trailing patch component is accepted and dropped.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.trim().trim_start_matches('v').split('.');
        let major = parts
            .next()
            .filter(|part| !part.is_empty())
            .context(error::MalformedVersionSnafu { input })?
            .parse()
            .context(error::VersionComponentSnafu { input })?;
        let minor = parts
            .next()
            .context(error::MalformedVersionSnafu { input })?
            .parse()
            .context(error::VersionComponentSnafu { input })?;

        Ok(ClusterVersion::new(major, minor))
    }
}

impl Display for ClusterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

/// Cluster metadata read from `DescribeCluster`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClusterDetails {
    pub name: String,
    pub region: String,
    pub version: String,
    pub status: String,
    pub vpc_id: String,
    /// The API server endpoint, needed only to talk to Kubernetes directly.
    pub endpoint: Option<String>,
    /// Base64 encoded PEM bundle of the cluster certificate authority.
    pub certificate_authority: Option<String>,
}

impl ClusterDetails {
    pub fn cluster_ref(&self) -> ClusterRef {
        ClusterRef::new(&self.name, &self.region)
    }

    pub fn parsed_version(&self) -> Result<ClusterVersion, error::Error> {
        self.version.parse()
    }
}

pub mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub))]
    pub enum Error {
        #[snafu(display("Cluster version '{}' is not in 'major.minor' form", input))]
        MalformedVersion { input: String },

        #[snafu(display("Cluster version '{}' has a non-numeric component: '{}'", input, source))]
        VersionComponent {
            input: String,
            source: std::num::ParseIntError,
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_cluster_version() {
        let mut test_cases = vec![
            ("1.28", Some(ClusterVersion::new(1, 28))),
            ("1.24", Some(ClusterVersion::new(1, 24))),
            (" 1.30 ", Some(ClusterVersion::new(1, 30))),
            ("v1.29", Some(ClusterVersion::new(1, 29))),
            ("1.27.4", Some(ClusterVersion::new(1, 27))),
            ("1", None),
            ("", None),
            ("one.two", None),
            ("1.x", None),
        ];

        for (input, expected) in test_cases.drain(..) {
            let parsed = input.parse::<ClusterVersion>().ok();
            assert_eq!(parsed, expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_cluster_version_ordering() {
        let threshold = ClusterVersion::new(1, 25);
        assert!(ClusterVersion::new(1, 24) < threshold);
        assert!(ClusterVersion::new(1, 25) >= threshold);
        assert!(ClusterVersion::new(1, 28) > threshold);
        assert!(ClusterVersion::new(1, 100) > ClusterVersion::new(1, 9));
        assert_eq!(ClusterVersion::new(1, 28).to_string(), "1.28");
    }
}
