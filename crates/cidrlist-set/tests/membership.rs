use cidrlist_set::{AddressFamily, NetworkSet, ParseErrorKind, QueryMode};

const INTERNAL_IPS: [&str; 4] = ["10.0.0.0/8", "127.0.0.1/8", "1.2.3.0/24", "8.8.8.8"];

#[test]
fn test_internal_ips_end_to_end() {
    let set = NetworkSet::new(INTERNAL_IPS).expect("valid entries");

    let expected = [
        ("10.10.10.1", true),
        ("127.0.0.1", true),
        ("127.0.0.2", true),
        ("192.168.1.1", false),
        ("1.2.3.4", true),
        ("8.8.8.8", true),
        ("8.8.4.4", false),
    ];

    for (addr, member) in expected {
        assert_eq!(set.contains(addr).unwrap(), member, "{}", addr);
        let mapped = format!("::ffff:{}", addr);
        assert_eq!(set.contains(&mapped).unwrap(), member, "{}", mapped);
    }
}

#[test]
fn test_host_entry_is_reflexive() {
    let set = NetworkSet::new(["8.8.8.8"]).unwrap();
    assert!(set.contains("8.8.8.8").unwrap());
    assert!(!set.contains("8.8.4.4").unwrap());

    let set = NetworkSet::new(["2001:4860:4860::8888"]).unwrap();
    assert!(set.contains("2001:4860:4860:0:0:0:0:8888").unwrap());
    assert!(!set.contains("2001:4860:4860::8844").unwrap());
}

#[test]
fn test_mask_notations_build_equal_sets() {
    let by_prefix = NetworkSet::new(["192.168.0.0/16", "10.0.0.0/8"]).unwrap();
    let by_netmask = NetworkSet::new(["192.168.0.0/255.255.0.0", "10.0.0.0/255.0.0.0"]).unwrap();
    let by_hostmask =
        NetworkSet::new(["192.168.0.0/0.0.255.255", "10.0.0.0/0.255.255.255"]).unwrap();

    assert_eq!(by_prefix, by_netmask);
    assert_eq!(by_prefix, by_hostmask);
}

#[test]
fn test_non_aligned_entries_are_canonicalized() {
    let loose = NetworkSet::new(["192.168.1.1/24"]).unwrap();
    let strict = NetworkSet::new(["192.168.1.0/24"]).unwrap();
    assert_eq!(loose, strict);
    assert_eq!(loose.to_string(), "192.168.1.0/24");
}

#[test]
fn test_non_contiguous_masks_rejected() {
    for entry in ["10.0.0.0/255.0.255.0", "10.0.0.0/0.255.0.255", "10.0.0.0/255.255.255.254.0"] {
        let err = NetworkSet::new([entry]).unwrap_err();
        assert_eq!(err.input(), entry);
        assert_eq!(err.family(), Some(AddressFamily::V4));
    }

    let err = NetworkSet::new(["10.0.0.0/255.0.255.0"]).unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::NonContiguousMask);
}

#[test]
fn test_dual_stack_set() {
    let set = NetworkSet::new(["10.0.0.0/8", "fd00::/8", "::1"]).unwrap();

    assert!(set.contains("10.255.0.1").unwrap());
    assert!(set.contains("fd12:3456::1").unwrap());
    assert!(set.contains("::1").unwrap());
    assert!(!set.contains("fe80::1").unwrap());
    assert!(!set.contains("11.0.0.1").unwrap());
}

#[test]
fn test_ipv4_only_queries_reject_ipv6() {
    let set = NetworkSet::new(["fd00::/8"]).unwrap();
    let err = set.contains_with("fd00::1", QueryMode::Ipv4Only).unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::FamilyNotAllowed);
}

#[test]
fn test_shared_set_across_threads() {
    let set = std::sync::Arc::new(NetworkSet::new(INTERNAL_IPS).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let set = std::sync::Arc::clone(&set);
            std::thread::spawn(move || set.contains(&format!("10.0.0.{}", i)).unwrap())
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
