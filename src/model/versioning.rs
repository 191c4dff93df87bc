/// Policy deciding how multiple values under one logical qualifier are told
/// apart and ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum VersioningModel {
    /// One value per qualifier; the store's own timestamp handling applies.
    #[default]
    None,
    /// Version appended to the qualifier, ascending byte order.
    QualifierSequential,
    /// Version appended to the qualifier after inversion, so the most recent
    /// version sorts first.
    QualifierLatest,
    /// Version carried as the cell timestamp.
    TimestampChrono,
    /// Version carried as the cell timestamp after inversion.
    TimestampLatest,
}

impl VersioningModel {
    /// Whether the version is embedded in the physical qualifier bytes.
    pub const fn is_qualifier_based(self) -> bool {
        matches!(
            self,
            VersioningModel::QualifierSequential | VersioningModel::QualifierLatest
        )
    }

    /// Whether the version is carried in the cell timestamp.
    pub const fn is_timestamp_based(self) -> bool {
        matches!(
            self,
            VersioningModel::TimestampChrono | VersioningModel::TimestampLatest
        )
    }

    /// Whether versions are stored as `i64::MAX - version`.
    pub const fn is_inverting(self) -> bool {
        matches!(
            self,
            VersioningModel::QualifierLatest | VersioningModel::TimestampLatest
        )
    }

    /// Whether a version number means anything under this policy.
    pub const fn is_versioned(self) -> bool {
        !matches!(self, VersioningModel::None)
    }
}
