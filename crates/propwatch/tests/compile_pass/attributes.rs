//! Test: rename, readonly and skip together.

use propwatch::KeyValue;

#[derive(Clone, Default, KeyValue)]
struct Account {
    #[key(readonly)]
    id: u32,

    #[key(rename = "ownerName")]
    owner_name: String,

    #[key(skip)]
    cache: Vec<u8>,

    r#type: String,
}

fn main() {
    let account = Account::default();
    assert_eq!(Account::keys(), &["id", "ownerName", "type"]);
    assert!(account.cache.is_empty());
    let _ = account.get_key("ownerName");
}
