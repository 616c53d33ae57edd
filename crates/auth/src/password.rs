//! Passwort-Hashing mit Argon2id
//!
//! Argon2id ist speicherintensiv und hat einen einstellbaren Kostenfaktor.
//! Die `*_async`-Varianten verlagern die Arbeit auf den Blocking-Pool von
//! tokio, damit der Executor nicht fuer ~100 ms pro Hash steht.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};

use crate::error::{AuthError, AuthResult};

/// Argon2id-Parameter fuer sicheres Passwort-Hashing
///
/// Werte gemaess OWASP-Empfehlungen (Stand 2024):
/// - Speicher: 64 MiB
/// - Iterationen: 3
/// - Parallelismus: 1
fn argon2_instanz() -> AuthResult<Argon2<'static>> {
    let params = Params::new(
        64 * 1024, // m_cost: 64 MiB
        3,         // t_cost: 3 Iterationen
        1,         // p_cost: 1 Thread
        None,      // output_len: Standard (32 Bytes)
    )
    .map_err(|e| AuthError::PasswortHashing(format!("Argon2-Parameter ungueltig: {e}")))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hasht ein Passwort mit Argon2id und einem zufaelligen Salt
///
/// Gibt den PHC-String zurueck (inkl. Algorithmus, Parameter und Salt).
pub fn passwort_hashen(passwort: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    argon2_instanz()?
        .hash_password(passwort.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswortHashing(e.to_string()))
}

/// Verifiziert ein Passwort gegen einen gespeicherten PHC-Hash
///
/// Gibt `true` zurueck wenn das Passwort korrekt ist.
pub fn passwort_verifizieren(passwort: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::PasswortHashing(format!("Ungueltiges Hash-Format: {e}")))?;

    match argon2_instanz()?.verify_password(passwort.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswortHashing(e.to_string())),
    }
}

/// Fester Argon2id-Hash mit denselben Parametern wie `argon2_instanz`
///
/// Passt zu keinem Passwort.
const VERGLEICHS_HASH: &str = "$argon2id$v=19$m=65536,t=3,p=1$C3qelgbWMOeg+Nmrw1NQtw$mPExrsI9GZacpMONm0DziHyBxmLYvL2FpHGz1q3QhYo";

/// Verifiziert gegen einen festen Hash und verwirft das Ergebnis
///
/// Fuer Anmeldungen mit unbekannter E-Mail: kostet so viel wie eine echte
/// Verifikation.
pub async fn vergleichs_verifikation_async(passwort: String) -> AuthResult<()> {
    passwort_verifizieren_async(passwort, VERGLEICHS_HASH.to_string())
        .await
        .map(|_| ())
}

/// [`passwort_hashen`] auf dem Blocking-Pool
pub async fn passwort_hashen_async(passwort: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || passwort_hashen(&passwort))
        .await
        .map_err(|e| AuthError::intern(format!("Hash-Task abgebrochen: {e}")))?
}

/// [`passwort_verifizieren`] auf dem Blocking-Pool
pub async fn passwort_verifizieren_async(passwort: String, hash: String) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || passwort_verifizieren(&passwort, &hash))
        .await
        .map_err(|e| AuthError::intern(format!("Verifikations-Task abgebrochen: {e}")))?
}
