//! Mapping of chain transactions into the proving service schema.

use alloy::primitives::{U256, hex};

use crate::domain::{ProofRequest, TransactionData, TransactionRecord};

/// Rendering of an absent or zero fee quantity
pub const ZERO_QUANTITY: &str = "0x00";

/// Build the proof request for a fetched transaction.
///
/// Legacy transactions report their gas price as the tip cap and a zero fee
/// cap; every other type reports the EIP-1559 priority fee and max fee.
#[must_use]
pub fn map_to_proof_request(record: &TransactionRecord) -> ProofRequest {
    ProofRequest::with_transaction(map_transaction(record))
}

/// Map a single transaction record to its proving service entry
#[must_use]
pub fn map_transaction(record: &TransactionRecord) -> TransactionData {
    let (gas_tip_cap_or_gas_price, gas_fee_cap) = if record.is_legacy() {
        (quantity_or_zero(record.gas_price), ZERO_QUANTITY.to_string())
    } else {
        (
            quantity_or_zero(record.max_priority_fee_per_gas),
            quantity_or_zero(record.max_fee_per_gas),
        )
    };

    TransactionData {
        hash: record.hash.clone(),
        chain_id: record.chain_id,
        block_num: record.block_number,
        nonce: record.nonce,
        gas_tip_cap_or_gas_price,
        gas_fee_cap,
        gas_limit: record.gas_limit.to_string(),
        from: record.from.to_checksum(None),
        to: record.to.map(|to| to.to_checksum(None)),
        value: quantity_hex(record.value),
    }
}

fn quantity_or_zero(quantity: Option<U256>) -> String {
    quantity.map_or_else(|| ZERO_QUANTITY.to_string(), quantity_hex)
}

/// Render a quantity as minimal big-endian bytes in `0x`-prefixed hex.
///
/// Output always has an even number of digits; zero renders as `0x00`.
#[must_use]
pub fn quantity_hex(value: U256) -> String {
    if value.is_zero() {
        return ZERO_QUANTITY.to_string();
    }
    hex::encode_prefixed(value.to_be_bytes_trimmed_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, address};

    fn legacy_record() -> TransactionRecord {
        TransactionRecord {
            hash: "0xdeadbeef".to_string(),
            chain_id: 56,
            block_number: Some(38_000_000),
            nonce: 7,
            tx_type: 0,
            gas_price: Some(U256::from(1_000_000_000u64)),
            max_priority_fee_per_gas: Some(U256::from(1_500_000_000u64)),
            max_fee_per_gas: Some(U256::from(2_000_000_000u64)),
            gas_limit: 21_000,
            from: address!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            to: Some(Address::repeat_byte(0x22)),
            value: U256::from(1_000_000_000_000_000_000u64),
        }
    }

    #[test]
    fn test_legacy_uses_gas_price_and_zero_fee_cap() {
        let data = map_transaction(&legacy_record());
        assert_eq!(data.gas_tip_cap_or_gas_price, "0x3b9aca00");
        assert_eq!(data.gas_fee_cap, "0x00");
    }

    #[test]
    fn test_legacy_without_gas_price_defaults_to_zero() {
        let record = TransactionRecord {
            gas_price: None,
            ..legacy_record()
        };
        let data = map_transaction(&record);
        assert_eq!(data.gas_tip_cap_or_gas_price, "0x00");
        assert_eq!(data.gas_fee_cap, "0x00");
    }

    #[test]
    fn test_dynamic_fee_uses_priority_and_max_fee() {
        let record = TransactionRecord {
            tx_type: 2,
            ..legacy_record()
        };
        let data = map_transaction(&record);
        assert_eq!(data.gas_tip_cap_or_gas_price, "0x59682f00");
        assert_eq!(data.gas_fee_cap, "0x77359400");
    }

    #[test]
    fn test_dynamic_fee_missing_fields_default_to_zero() {
        let record = TransactionRecord {
            tx_type: 2,
            max_priority_fee_per_gas: None,
            max_fee_per_gas: None,
            ..legacy_record()
        };
        let data = map_transaction(&record);
        assert_eq!(data.gas_tip_cap_or_gas_price, "0x00");
        assert_eq!(data.gas_fee_cap, "0x00");
    }

    #[test]
    fn test_access_list_type_takes_dynamic_branch() {
        let record = TransactionRecord {
            tx_type: 1,
            max_priority_fee_per_gas: None,
            max_fee_per_gas: None,
            ..legacy_record()
        };
        let data = map_transaction(&record);
        // Only type 0 reads the gas price
        assert_eq!(data.gas_tip_cap_or_gas_price, "0x00");
    }

    #[test]
    fn test_passthrough_fields() {
        let record = legacy_record();
        let request = map_to_proof_request(&record);

        assert_eq!(request.transactions.len(), 1);
        assert_eq!(request.primary_hash(), Some("0xdeadbeef"));
        let data = &request.transactions[0];
        assert_eq!(data.chain_id, 56);
        assert_eq!(data.block_num, Some(38_000_000));
        assert_eq!(data.nonce, 7);
        assert_eq!(data.gas_limit, "21000");
        assert_eq!(data.from, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert_eq!(
            data.to.as_deref(),
            Some("0x2222222222222222222222222222222222222222")
        );
        assert_eq!(data.value, "0x0de0b6b3a7640000");
        assert!(request.receipts.is_empty());
        assert!(request.storages.is_empty());
        assert!(request.custom_input.is_none());
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let record = legacy_record();
        assert_eq!(map_to_proof_request(&record), map_to_proof_request(&record));
    }

    #[test]
    fn test_contract_creation_keeps_empty_to() {
        let record = TransactionRecord {
            to: None,
            ..legacy_record()
        };
        assert!(map_transaction(&record).to.is_none());
    }

    #[test]
    fn test_quantity_hex_is_even_length() {
        assert_eq!(quantity_hex(U256::ZERO), "0x00");
        assert_eq!(quantity_hex(U256::from(1u64)), "0x01");
        assert_eq!(quantity_hex(U256::from(0x10u64)), "0x10");
        assert_eq!(quantity_hex(U256::from(0x3b9aca00u64)), "0x3b9aca00");
        assert_eq!(quantity_hex(U256::MAX), format!("0x{}", "ff".repeat(32)));
    }
}
