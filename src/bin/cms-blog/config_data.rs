use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;

const CONFIG_SAMPLE: &str = r#"# Search endpoint of the CMS, usually reached through the edge proxy
[cms]
base_url = "https://proxy.example.workers.dev/search/content/"
filter = "ContentType/any(t:t eq 'BlogPostPage')"
order_by = "StartPublish desc"
personalize = true
page_size = 100
timeout_secs = 30
dedupe_by_guid = false

# Used when a post URL does not carry /YYYY/MM/
[defaults]
fallback_year = 2024
fallback_month = "01"
words_per_minute = 200
card_tag_limit = 5
excerpt_length = 150
latest_count = 2
cache_secs = 3600

[server]
address = "0.0.0.0"
port = 8001

# For the file locations, If you want it to be relative to the executable directory
# use ${exe_dir}/location
[log]
level = "Info"
log_to_console = true
"#;

pub(crate) fn write_sample_cfg(file_path: &Path) -> io::Result<()> {
    let mut file = File::create(file_path)?;
    file.write_all(CONFIG_SAMPLE.as_bytes())
}

#[cfg(test)]
mod tests {
    use cms_blog::config::parse_config;

    use super::*;

    #[test]
    fn test_sample_is_valid() {
        let cfg = parse_config(CONFIG_SAMPLE).unwrap();
        assert_eq!(cfg.server.port, 8001);
        assert!(cfg.log.unwrap().location.is_none());
    }
}
