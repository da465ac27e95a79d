use crate::backends::DnsRecord;

/// Exact match on type and name; the last match in listing order wins.
pub fn select<'a>(
    records: &'a [DnsRecord],
    dns_type: &str,
    name: &str,
) -> Option<&'a DnsRecord> {
    records
        .iter()
        .rev()
        .find(|r| r.dns_type == dns_type && r.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::record;

    fn zone() -> Vec<DnsRecord> {
        vec![
            record("z", "1", "A", "home.example.com", "1.1.1.1"),
            record("z", "2", "AAAA", "home.example.com", "2001:db8::1"),
            record("z", "3", "A", "www.example.com", "1.1.1.1"),
            record("z", "4", "A", "home.example.com", "2.2.2.2"),
            record("z", "5", "TXT", "home.example.com", ""),
        ]
    }

    #[test]
    fn no_match_is_none() {
        let records = zone();
        assert!(select(&records, "A", "mail.example.com").is_none());
        assert!(select(&records, "CNAME", "home.example.com").is_none());
        assert!(select(&[], "A", "home.example.com").is_none());
    }

    #[test]
    fn duplicates_resolve_to_the_last() {
        let records = zone();
        assert_eq!(select(&records, "A", "home.example.com").unwrap().id, "4");
    }

    #[test]
    fn type_and_name_must_both_match() {
        let records = zone();
        assert_eq!(select(&records, "AAAA", "home.example.com").unwrap().id, "2");
        assert_eq!(select(&records, "A", "www.example.com").unwrap().id, "3");
    }

    #[test]
    fn empty_content_is_still_found() {
        let records = zone();
        let r = select(&records, "TXT", "home.example.com").unwrap();
        assert_eq!(r.id, "5");
        assert!(r.content.is_empty());
    }
}
