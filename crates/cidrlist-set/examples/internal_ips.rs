//! Internal address check example
//!
//! Run with: cargo run -p cidrlist-set --example internal_ips

use cidrlist_set::NetworkSet;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cidrlist - internal address check\n");

    let internal =
        NetworkSet::new(["10.0.0.0/8", "127.0.0.1/8", "1.2.3.0/24", "8.8.8.8"])?;
    println!("Entries: {}", internal);
    println!("─────────────────────────────");

    let checks = [
        ("10.10.10.1", true),
        ("127.0.0.1", true),
        ("127.0.0.2", true),
        ("192.168.1.1", false),
        ("1.2.3.4", true),
        ("8.8.8.8", true),
        ("8.8.4.4", false),
    ];

    for (i, (addr, expected)) in checks.iter().enumerate() {
        let member = internal.contains(addr)?;
        println!("test {}: {:<12} in set? {}", i + 1, addr, member);
        assert_eq!(member, *expected);
    }

    Ok(())
}
