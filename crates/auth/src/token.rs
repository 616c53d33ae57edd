//! Token-Aussteller (HS256-JWT)
//!
//! Stellt kurzlebige Access-Tokens und langlebige Refresh-Tokens aus und
//! verifiziert sie ohne serverseitigen Zustand. Jedes Token traegt genau zwei
//! Claims: `user_id` und `exp` (Unix-Sekunden).
//!
//! Die Token-Art steht im JOSE-Header (`typ`), nicht in den Claims:
//! `at+jwt` fuer Access-Tokens, `rt+jwt` fuer Refresh-Tokens.
//!
//! Schluesselrotation: neue Tokens werden immer mit dem aktuellen Secret
//! signiert, zur Verifikation werden zusaetzlich die vorherigen Secrets
//! akzeptiert.

use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, get_current_timestamp, Algorithm, DecodingKey, EncodingKey,
    Header, TokenData, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Mindestlaenge eines Signatur-Secrets in Bytes
pub const MIN_SECRET_LAENGE: usize = 32;

/// Standard-Lebensdauer eines Access-Tokens: 1 Stunde
pub const STANDARD_ACCESS_TTL: Duration = Duration::from_secs(60 * 60);

/// Standard-Lebensdauer eines Refresh-Tokens: 7 Tage
pub const STANDARD_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const ALGORITHMUS: Algorithm = Algorithm::HS256;

/// Art eines Tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenArt {
    Access,
    Refresh,
}

impl TokenArt {
    /// Wert des `typ`-Headers
    pub const fn typ(self) -> &'static str {
        match self {
            TokenArt::Access => "at+jwt",
            TokenArt::Refresh => "rt+jwt",
        }
    }

    fn aus_header(header: &Header) -> Option<Self> {
        match header.typ.as_deref() {
            Some("at+jwt") => Some(TokenArt::Access),
            Some("rt+jwt") => Some(TokenArt::Refresh),
            _ => None,
        }
    }
}

/// Claim-Set eines Tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identitaet des Benutzers
    pub user_id: String,
    /// Ablaufzeitpunkt (Unix-Sekunden)
    pub exp: u64,
}

/// Access- und Refresh-Token nach erfolgreicher Anmeldung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPaar {
    pub access_token: String,
    pub refresh_token: String,
}

/// Konfiguration des Token-Ausstellers
#[derive(Clone)]
pub struct JwtKonfig {
    /// Aktuelles Signatur-Secret
    pub secret: String,
    /// Frueher verwendete Secrets, nur noch zur Verifikation
    pub vorherige_secrets: Vec<String>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtKonfig {
    /// Konfiguration mit Standard-Lebensdauern
    pub fn neu(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            vorherige_secrets: Vec::new(),
            access_ttl: STANDARD_ACCESS_TTL,
            refresh_ttl: STANDARD_REFRESH_TTL,
        }
    }

    /// Prueft Secret-Laengen und dass Access-Tokens vor Refresh-Tokens ablaufen
    pub fn validieren(&self) -> AuthResult<()> {
        if self.secret.len() < MIN_SECRET_LAENGE {
            return Err(AuthError::Konfiguration(format!(
                "JWT-Secret muss mindestens {MIN_SECRET_LAENGE} Bytes lang sein"
            )));
        }
        if self
            .vorherige_secrets
            .iter()
            .any(|s| s.len() < MIN_SECRET_LAENGE)
        {
            return Err(AuthError::Konfiguration(format!(
                "Vorherige JWT-Secrets muessen mindestens {MIN_SECRET_LAENGE} Bytes lang sein"
            )));
        }
        if self.access_ttl.is_zero() {
            return Err(AuthError::Konfiguration("Access-TTL darf nicht 0 sein".into()));
        }
        if self.access_ttl >= self.refresh_ttl {
            return Err(AuthError::Konfiguration(
                "Access-TTL muss kleiner als Refresh-TTL sein".into(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for JwtKonfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKonfig")
            .field("secret", &"[REDACTED]")
            .field("vorherige_secrets", &self.vorherige_secrets.len())
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Stellt signierte Tokens aus und verifiziert sie
#[derive(Clone)]
pub struct JwtAussteller {
    encoding_key: EncodingKey,
    /// Aktueller Schluessel zuerst, danach die vorherigen
    decoding_keys: Vec<DecodingKey>,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtAussteller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAussteller")
            .field("algorithmus", &ALGORITHMUS)
            .field("schluessel", &self.decoding_keys.len())
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtAussteller {
    /// Erstellt einen Aussteller aus einer validierten Konfiguration
    pub fn neu(konfig: &JwtKonfig) -> AuthResult<Self> {
        konfig.validieren()?;

        let decoding_keys = std::iter::once(&konfig.secret)
            .chain(konfig.vorherige_secrets.iter())
            .map(|s| DecodingKey::from_secret(s.as_bytes()))
            .collect();

        let mut validation = Validation::new(ALGORITHMUS);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(konfig.secret.as_bytes()),
            decoding_keys,
            validation,
            access_ttl: konfig.access_ttl,
            refresh_ttl: konfig.refresh_ttl,
        })
    }

    /// Stellt ein Access-Token aus (Standard: 1 Stunde gueltig)
    pub fn access_token_ausstellen(&self, identitaet: &str) -> AuthResult<String> {
        self.ausstellen(identitaet, TokenArt::Access)
    }

    /// Stellt ein Refresh-Token aus (Standard: 7 Tage gueltig)
    pub fn refresh_token_ausstellen(&self, identitaet: &str) -> AuthResult<String> {
        self.ausstellen(identitaet, TokenArt::Refresh)
    }

    /// Stellt Access- und Refresh-Token fuer dieselbe Identitaet aus
    pub fn token_paar_ausstellen(&self, identitaet: &str) -> AuthResult<TokenPaar> {
        Ok(TokenPaar {
            access_token: self.access_token_ausstellen(identitaet)?,
            refresh_token: self.refresh_token_ausstellen(identitaet)?,
        })
    }

    /// Verifiziert Signatur, Algorithmus und Ablauf eines Tokens
    ///
    /// Reine Pruefung ohne Seiteneffekte, unabhaengig von der Token-Art.
    pub fn verifizieren(&self, token: &str) -> AuthResult<Claims> {
        self.dekodieren(token).map(|daten| daten.claims)
    }

    /// Wie [`verifizieren`](Self::verifizieren), verlangt aber zusaetzlich die
    /// angegebene Token-Art im Header
    pub fn verifizieren_als(&self, token: &str, art: TokenArt) -> AuthResult<Claims> {
        let daten = self.dekodieren(token)?;
        match TokenArt::aus_header(&daten.header) {
            Some(gefunden) if gefunden == art => Ok(daten.claims),
            gefunden => {
                tracing::debug!(erwartet = ?art, gefunden = ?gefunden, "Falsche Token-Art");
                Err(AuthError::TokenUngueltig)
            }
        }
    }

    /// Stellt ein neues Access-Token fuer die Identitaet eines gueltigen
    /// Refresh-Tokens aus
    ///
    /// Es wird kein neues Refresh-Token ausgestellt. Access-Tokens werden
    /// abgelehnt.
    pub fn erneuern(&self, refresh_token: &str) -> AuthResult<String> {
        let claims = self.verifizieren_als(refresh_token, TokenArt::Refresh)?;
        self.access_token_ausstellen(&claims.user_id)
    }

    fn dekodieren(&self, token: &str) -> AuthResult<TokenData<Claims>> {
        for key in &self.decoding_keys {
            match decode::<Claims>(token, key, &self.validation) {
                Ok(daten) => return Ok(daten),
                // Mit dem naechsten (aelteren) Schluessel versuchen
                Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature) => continue,
                Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                    return Err(AuthError::TokenAbgelaufen)
                }
                Err(e) => {
                    tracing::debug!(fehler = %e, "Token-Verifikation fehlgeschlagen");
                    return Err(AuthError::TokenUngueltig);
                }
            }
        }
        Err(AuthError::TokenUngueltig)
    }

    fn ausstellen(&self, identitaet: &str, art: TokenArt) -> AuthResult<String> {
        let ttl = match art {
            TokenArt::Access => self.access_ttl,
            TokenArt::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            user_id: identitaet.to_string(),
            exp: get_current_timestamp() + ttl.as_secs(),
        };
        self.signieren(&claims, art)
    }

    pub(crate) fn signieren(&self, claims: &Claims, art: TokenArt) -> AuthResult<String> {
        let mut header = Header::new(ALGORITHMUS);
        header.typ = Some(art.typ().to_string());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenSignieren(e.to_string()))
    }
}
