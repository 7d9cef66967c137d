use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
};

use crate::error::AppError;

/// 本番のArgon2idコスト（メモリ KiB）
pub const ARGON2_M_COST: u32 = 19_456;
/// 本番のArgon2idコスト（反復回数）
pub const ARGON2_T_COST: u32 = 2;
/// 本番のArgon2idコスト（並列度）
pub const ARGON2_P_COST: u32 = 1;

/// パスワード（およびリセットコード）のハッシュ化
///
/// # Security
/// - 平文はログに出力しない
/// - 検証時のエラーは全て「不一致」として扱う
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// ユーザー不在時のダミー検証用ハッシュ
    dummy_hash: String,
}

impl PasswordHasher {
    /// 本番コストで作成
    pub fn new() -> Result<Self, AppError> {
        Self::with_cost(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST)
    }

    /// コストを指定して作成（テストでは低コストを使う）
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, AppError> {
        let params = Params::new(m_cost, t_cost, p_cost, None).map_err(|e| {
            tracing::error!(error = ?e, "Argon2パラメータが不正");
            AppError::Internal(anyhow::anyhow!("invalid argon2 params"))
        })?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut hasher = Self {
            argon2,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash("corpsite-dummy-password")?;
        Ok(hasher)
    }

    /// argon2idでハッシュ化（呼び出しごとにランダムなソルト）
    pub fn hash(&self, plain: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = ?e, "パスワードハッシュ生成エラー");
                AppError::Internal(anyhow::anyhow!("password hash error"))
            })?;
        Ok(hash.to_string())
    }

    /// 平文とハッシュを照合
    ///
    /// パース失敗などのエラーは false を返す
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = ?e, "パスワードハッシュのパースエラー");
                return false;
            }
        };

        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// タイミング攻撃対策: ユーザー不在時も同じコストの検証を実行
    pub fn verify_dummy(&self, plain: &str) {
        let _ = self.verify(plain, &self.dummy_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_cost(8, 1, 1).expect("hasher")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("Secur3P@ssw0rd!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("Secur3P@ssw0rd!", &hash));
        assert!(!hasher.verify("wrong-password", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = hasher();
        let a = hasher.hash("same-password").unwrap();
        let b = hasher.hash("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_malformed_hash_is_false() {
        let hasher = hasher();
        assert!(!hasher.verify("anything", "not-a-valid-hash"));
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn test_production_cost_is_embedded_in_hash() {
        let hasher = PasswordHasher::new().unwrap();
        let hash = hasher.hash("password123").unwrap();
        assert!(hash.contains("m=19456,t=2,p=1"));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(PasswordHasher::with_cost(0, 0, 0).is_err());
    }
}
