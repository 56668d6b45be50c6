// src/usuarios/usuario_structs.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};

/// Perfil do usuário dentro do mercado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoUsuario {
    /// Dono do mercado: acesso ao painel administrativo.
    Owner,
    /// Operador de caixa.
    Operator,
}

impl TipoUsuario {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoUsuario::Owner => "owner",
            TipoUsuario::Operator => "operator",
        }
    }
}

impl FromStr for TipoUsuario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(TipoUsuario::Owner),
            "operator" => Ok(TipoUsuario::Operator),
            outro => Err(format!("tipo de usuário desconhecido: {}", outro)),
        }
    }
}

impl fmt::Display for TipoUsuario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estrutura que representa um usuário no banco de dados.
/// A senha será armazenada como um hash.
#[derive(Debug, Clone)]
pub struct Usuario {
    pub id: i32,
    pub market_id: i32,
    pub nome: String,
    pub email: String,
    pub senha_hash: String, // Armazenará o hash da senha
    pub tipo: TipoUsuario,
}

impl<'r> FromRow<'r, PgRow> for Usuario {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let tipo: String = row.try_get("tipo")?;
        Ok(Self {
            id: row.try_get("id")?,
            market_id: row.try_get("market_id")?,
            nome: row.try_get("nome")?,
            email: row.try_get("email")?,
            senha_hash: row.try_get("senha_hash")?,
            tipo: tipo.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        })
    }
}

/// Dados públicos de um usuário (sem o hash da senha).
#[derive(Debug, Serialize)]
pub struct UsuarioResponse {
    pub id: i32,
    pub market_id: i32,
    pub nome: String,
    pub email: String,
    pub tipo: TipoUsuario,
}

impl From<Usuario> for UsuarioResponse {
    fn from(u: Usuario) -> Self {
        UsuarioResponse {
            id: u.id,
            market_id: u.market_id,
            nome: u.nome,
            email: u.email,
            tipo: u.tipo,
        }
    }
}

/// Estrutura para receber dados de um novo operador.
#[derive(Deserialize)]
pub struct NovoUsuario {
    pub nome: String,
    pub email: String,
    pub senha: String, // Senha em texto claro (será hashed antes de salvar)
}

/// Atualização de operador. A senha só é trocada quando informada.
#[derive(Deserialize)]
pub struct AtualizarUsuario {
    pub nome: String,
    pub email: String,
    pub senha: Option<String>,
}

/// Nome e e-mail não podem ficar em branco, no cadastro nem na edição.
pub fn validar_nome_email(nome: &str, email: &str) -> Result<(), String> {
    if nome.trim().is_empty() || email.trim().is_empty() {
        return Err("Nome e e-mail são obrigatórios.".to_string());
    }
    Ok(())
}

/// Estrutura para receber dados de login do usuário.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String, // Senha em texto claro
}

/// Estrutura para o payload do JWT (Claims).
/// Contém informações sobre o usuário e a expiração do token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // Subject (ID do usuário)
    pub name: String, // Nome do usuário
    pub email: String, // Email do usuário
    pub market_id: i32,
    pub tipo: TipoUsuario,
    pub exp: i64, // Expiration Time (timestamp Unix)
}

/// Estrutura para a resposta de sucesso do login.
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub usuario: UsuarioResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nome_e_email_obrigatorios() {
        assert!(validar_nome_email("Bruno", "bruno@mercado.com").is_ok());
        assert!(validar_nome_email("  ", "bruno@mercado.com").is_err());
        assert!(validar_nome_email("Bruno", "").is_err());
    }
}
