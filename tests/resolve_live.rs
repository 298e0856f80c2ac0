//! Exercises the iterative resolver against the real root server hierarchy.
//! Ignored by default since sandboxed or offline environments can't reach
//! the network; run explicitly with `cargo test -- --ignored`.

use dns_proto::{decode_header, QueryType, Reader};
use dns_resolver::{Config, IterativeResolver, Resolve};

#[tokio::test]
#[ignore = "requires outbound network access to the root server hierarchy"]
async fn resolves_a_well_known_domain() {
    let resolver = IterativeResolver::new(Config::default()).await.unwrap();
    let response = resolver.resolve("iana.org", QueryType::A).await.unwrap();

    let mut reader = Reader::new(&response);
    let header = decode_header(&mut reader).unwrap();
    assert!(header.answers > 0, "expected at least one answer record");
}

#[tokio::test]
#[ignore = "requires outbound network access to the root server hierarchy"]
async fn follows_glueless_delegation() {
    // example.com's authoritative servers aren't glued at the .com TLD
    // the same way iana.org's are, forcing a nested NS lookup.
    let resolver = IterativeResolver::new(Config::default()).await.unwrap();
    let response = resolver.resolve("example.com", QueryType::A).await.unwrap();

    let mut reader = Reader::new(&response);
    let header = decode_header(&mut reader).unwrap();
    assert!(header.answers > 0);
}
