/// Dimensions Cost Explorer accepts as a `GroupBy` key.
pub const GROUP_DIMENSIONS: &[&str] = &[
    "AZ",
    "INSTANCE_TYPE",
    "LINKED_ACCOUNT",
    "OPERATION",
    "PURCHASE_TYPE",
    "REGION",
    "SERVICE",
    "USAGE_TYPE",
    "USAGE_TYPE_GROUP",
    "RECORD_TYPE",
    "OPERATING_SYSTEM",
    "TENANCY",
    "SCOPE",
    "PLATFORM",
    "SUBSCRIPTION_ID",
    "LEGAL_ENTITY_NAME",
    "DEPLOYMENT_OPTION",
    "DATABASE_ENGINE",
    "CACHE_ENGINE",
    "INSTANCE_TYPE_FAMILY",
];

/// Regions queried when none are given on the command line or in the config.
pub const AWS_REGIONS: &[&str] = &[
    "us-east-1",      // US East (N. Virginia)
    "us-east-2",      // US East (Ohio)
    "us-west-1",      // US West (N. California)
    "us-west-2",      // US West (Oregon)
    "ca-central-1",   // Canada (Central)
    "eu-central-1",   // EU (Frankfurt)
    "eu-west-1",      // EU (Ireland)
    "eu-west-2",      // EU (London)
    "eu-west-3",      // EU (Paris)
    "ap-northeast-1", // Asia Pacific (Tokyo)
    "ap-northeast-2", // Asia Pacific (Seoul)
    "ap-northeast-3", // Asia Pacific (Osaka-Local)
    "ap-southeast-1", // Asia Pacific (Singapore)
    "ap-southeast-2", // Asia Pacific (Sydney)
    "ap-south-1",     // Asia Pacific (Mumbai)
    "sa-east-1",      // South America (Sao Paulo)
];

/// Built-in short names for common service labels.
pub const SERVICE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("AWS CloudTrail", "CT"),
    ("AWS Data Transfer", "DT"),
    ("AWS Key Management Service", "KMS"),
    ("AWS Support (Developer)", "SD"),
    ("Amazon DynamoDB", "DDB"),
    ("Amazon Elastic Block Store", "EBS"),
    ("Amazon Elastic Compute Cloud - Compute", "EC2"),
    ("Amazon Relational Database Service", "RDS"),
    ("Amazon Simple Email Service", "SES"),
    ("Amazon Simple Notification Service", "SNS"),
    ("Amazon Simple Queue Service", "SQS"),
    ("Amazon Simple Storage Service", "S3"),
    ("AmazonCloudWatch", "CW"),
    ("Refund", "Ref"),
];

pub fn is_valid_dimension(name: &str) -> bool {
    GROUP_DIMENSIONS.contains(&name)
}

pub fn is_known_region(region: &str) -> bool {
    AWS_REGIONS.contains(&region)
}

pub fn builtin_abbreviation(label: &str) -> Option<&'static str> {
    SERVICE_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, short)| *short)
}

/// Derive a short name by dropping a leading "AWS"/"Amazon" and keeping the
/// remaining uppercase letters and digits.
///
/// Returns `None` when nothing is left, e.g. for an all-lowercase label.
pub fn simple_abbreviation(label: &str) -> Option<String> {
    let rest = label
        .strip_prefix("AWS")
        .or_else(|| label.strip_prefix("Amazon"))
        .unwrap_or(label);
    let abbr: String = rest
        .chars()
        .filter(|c| c.is_uppercase() || c.is_numeric())
        .collect();
    if abbr.is_empty() {
        None
    } else {
        Some(abbr)
    }
}
