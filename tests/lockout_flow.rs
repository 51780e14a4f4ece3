//! End-to-end lockout behavior through the decrypt pipeline.

use std::sync::Arc;
use std::time::Duration;

use encbox::{AeadAlg, AttemptTracker, EncBoxError, Vault, VaultConfig};
use secrecy::SecretString;

fn vault_with_tracker() -> (Vault, Arc<AttemptTracker>) {
    let cfg = VaultConfig::default();
    let tracker = Arc::new(AttemptTracker::new(cfg.max_attempts, cfg.lockout_duration));
    (Vault::with_tracker(cfg, Arc::clone(&tracker)), tracker)
}

fn pw(s: &str) -> SecretString {
    SecretString::new(s.into())
}

#[test]
fn wrong_attempts_count_down_then_block() {
    let (v, _) = vault_with_tracker();
    let ct = v
        .encrypt(b"data", &pw("correcthorse"), AeadAlg::AesGcm, None)
        .unwrap();

    // Four wrong attempts report a shrinking budget.
    for expected_remaining in [4u32, 3, 2, 1] {
        match v.decrypt(&ct, &pw("wrongwrong"), "vault.enc") {
            Err(EncBoxError::InvalidPassword { remaining }) => {
                assert_eq!(remaining, expected_remaining)
            }
            other => panic!("expected InvalidPassword, got {other:?}"),
        }
    }

    // The fifth failure exhausts the budget and starts the lockout.
    let res = v.decrypt(&ct, &pw("wrongwrong"), "vault.enc");
    match res {
        Err(EncBoxError::Blocked { remaining }) => {
            assert!(remaining <= Duration::from_secs(15 * 60));
            assert!(remaining > Duration::ZERO);
        }
        other => panic!("expected Blocked, got {other:?}"),
    }

    // Even the correct password is refused while blocked, without touching
    // the verifier.
    let res = v.decrypt(&ct, &pw("correcthorse"), "vault.enc");
    assert!(matches!(res, Err(EncBoxError::Blocked { .. })));
}

#[test]
fn successful_decrypt_resets_the_counter() {
    let (v, tracker) = vault_with_tracker();
    let ct = v
        .encrypt(b"data", &pw("correcthorse"), AeadAlg::AesGcm, None)
        .unwrap();

    for _ in 0..3 {
        let _ = v.decrypt(&ct, &pw("wrongwrong"), "a.enc");
    }
    assert_eq!(tracker.attempt_count("a.enc"), 3);

    let pt = v.decrypt(&ct, &pw("correcthorse"), "a.enc").unwrap();
    assert_eq!(pt, b"data");
    assert_eq!(tracker.attempt_count("a.enc"), 0);

    // The budget is whole again afterwards.
    match v.decrypt(&ct, &pw("wrongwrong"), "a.enc") {
        Err(EncBoxError::InvalidPassword { remaining }) => assert_eq!(remaining, 4),
        other => panic!("expected InvalidPassword, got {other:?}"),
    }
}

#[test]
fn identifiers_do_not_share_budgets() {
    let (v, _) = vault_with_tracker();
    let ct = v
        .encrypt(b"data", &pw("correcthorse"), AeadAlg::AesGcm, None)
        .unwrap();

    for _ in 0..5 {
        let _ = v.decrypt(&ct, &pw("wrongwrong"), "first.enc");
    }
    assert!(matches!(
        v.decrypt(&ct, &pw("correcthorse"), "first.enc"),
        Err(EncBoxError::Blocked { .. })
    ));

    // Same container under another identifier decrypts fine.
    let pt = v.decrypt(&ct, &pw("correcthorse"), "second.enc").unwrap();
    assert_eq!(pt, b"data");
}

#[test]
fn corruption_does_not_burn_attempts() {
    let (v, tracker) = vault_with_tracker();
    let mut ct = v
        .encrypt(b"data", &pw("correcthorse"), AeadAlg::AesGcm, None)
        .unwrap();
    ct[29] ^= 0x01;

    for _ in 0..8 {
        let res = v.decrypt(&ct, &pw("correcthorse"), "c.enc");
        assert!(matches!(res, Err(EncBoxError::Corrupted)));
    }
    assert_eq!(tracker.attempt_count("c.enc"), 0);
    assert!(!tracker.is_blocked("c.enc"));
}

#[test]
fn malformed_input_does_not_burn_attempts() {
    let (v, tracker) = vault_with_tracker();
    for _ in 0..8 {
        let res = v.decrypt(&[0u8; 10], &pw("correcthorse"), "m.enc");
        assert!(matches!(res, Err(EncBoxError::Malformed)));
    }
    assert_eq!(tracker.attempt_count("m.enc"), 0);
}

#[test]
fn lockout_expires_and_attempts_resume() {
    let cfg = VaultConfig {
        max_attempts: 2,
        lockout_duration: Duration::from_millis(50),
        ..VaultConfig::default()
    };
    let tracker = Arc::new(AttemptTracker::new(cfg.max_attempts, cfg.lockout_duration));
    let v = Vault::with_tracker(cfg, tracker);

    let ct = v
        .encrypt(b"data", &pw("correcthorse"), AeadAlg::AesGcm, None)
        .unwrap();

    let _ = v.decrypt(&ct, &pw("wrongwrong"), "x.enc");
    let res = v.decrypt(&ct, &pw("wrongwrong"), "x.enc");
    assert!(matches!(res, Err(EncBoxError::Blocked { .. })));

    std::thread::sleep(Duration::from_millis(100));

    let pt = v.decrypt(&ct, &pw("correcthorse"), "x.enc").unwrap();
    assert_eq!(pt, b"data");
}
