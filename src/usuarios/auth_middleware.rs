// src/usuarios/auth_middleware.rs

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

// Importa as Claims do módulo de structs de usuário
use super::usuario_structs::{Claims, TipoUsuario, Usuario};
use crate::shared::erro::ErroApi;
use crate::AppState;

/// Struct que representa o usuário autenticado, contendo as claims do JWT.
/// Será extraída das requisições protegidas.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub market_id: i32,
    pub tipo: TipoUsuario,
}

impl AuthenticatedUser {
    /// Garante que o usuário é o dono do mercado.
    pub fn exigir_dono(&self) -> Result<(), ErroApi> {
        if self.tipo == TipoUsuario::Owner {
            Ok(())
        } else {
            Err(ErroApi::Proibido(
                "Apenas o dono do mercado pode realizar esta operação.".to_string(),
            ))
        }
    }
}

/// Gera um JWT assinado (HS256) para o usuário.
pub fn emitir_token(
    usuario: &Usuario,
    segredo: &str,
    validade_horas: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: usuario.id,
        name: usuario.nome.clone(),
        email: usuario.email.clone(),
        market_id: usuario.market_id,
        tipo: usuario.tipo,
        exp: (Utc::now() + Duration::hours(validade_horas)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(segredo.as_ref()),
    )
}

/// Decodifica e valida um JWT, devolvendo o usuário autenticado.
pub fn validar_token(token: &str, segredo: &str) -> Result<AuthenticatedUser, ErroApi> {
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(segredo.as_ref()), &validation)
        .map_err(|e| {
            tracing::warn!(erro = ?e, "Erro ao decodificar/validar JWT");
            let mensagem = match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token expirado.",
                jsonwebtoken::errors::ErrorKind::InvalidSignature => "Assinatura do token inválida.",
                jsonwebtoken::errors::ErrorKind::InvalidToken => "Token malformado.",
                _ => "Token de autenticação inválido.",
            };
            ErroApi::NaoAutorizado(mensagem.to_string())
        })?;

    Ok(AuthenticatedUser {
        user_id: token_data.claims.sub,
        user_name: token_data.claims.name,
        user_email: token_data.claims.email,
        market_id: token_data.claims.market_id,
        tipo: token_data.claims.tipo,
    })
}

/// Extrator de autenticação para Actix Web.
/// Este extrator tenta validar um token JWT presente no cabeçalho Authorization.
impl FromRequest for AuthenticatedUser {
    type Error = ErroApi;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extrair_usuario(req))
    }
}

fn extrair_usuario(req: &HttpRequest) -> Result<AuthenticatedUser, ErroApi> {
    // Acessa o AppState para obter a chave secreta JWT
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState não disponível no extrator de autenticação");
        ErroApi::Interno("Erro de configuração do servidor.".to_string())
    })?;

    let header_str = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ErroApi::NaoAutorizado("Token de autenticação ausente.".to_string()))?
        .to_str()
        .map_err(|_| ErroApi::NaoAutorizado("Token de autenticação inválido.".to_string()))?;

    // Verifica se o cabeçalho começa com "Bearer "
    let token = header_str.strip_prefix("Bearer ").ok_or_else(|| {
        ErroApi::NaoAutorizado("Formato de token inválido. Esperado 'Bearer <token>'.".to_string())
    })?;

    validar_token(token, &state.jwt_secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usuario(tipo: TipoUsuario) -> Usuario {
        Usuario {
            id: 7,
            market_id: 3,
            nome: "Ana".to_string(),
            email: "ana@mercado.com".to_string(),
            senha_hash: String::new(),
            tipo,
        }
    }

    #[test]
    fn token_emitido_e_validado() {
        let token = emitir_token(&usuario(TipoUsuario::Operator), "segredo", 1).unwrap();
        let autenticado = validar_token(&token, "segredo").unwrap();

        assert_eq!(autenticado.user_id, 7);
        assert_eq!(autenticado.market_id, 3);
        assert_eq!(autenticado.tipo, TipoUsuario::Operator);
        assert!(autenticado.exigir_dono().is_err());
    }

    #[test]
    fn token_com_outro_segredo_e_rejeitado() {
        let token = emitir_token(&usuario(TipoUsuario::Owner), "segredo", 1).unwrap();
        let erro = validar_token(&token, "outro").unwrap_err();
        assert!(matches!(erro, ErroApi::NaoAutorizado(_)));
    }

    #[test]
    fn token_expirado_e_rejeitado() {
        // Validation tem 60s de tolerância por padrão
        let token = emitir_token(&usuario(TipoUsuario::Owner), "segredo", -2).unwrap();
        match validar_token(&token, "segredo") {
            Err(ErroApi::NaoAutorizado(msg)) => assert_eq!(msg, "Token expirado."),
            outro => panic!("esperava token expirado, veio {:?}", outro),
        }
    }

    #[test]
    fn dono_passa_na_verificacao() {
        let token = emitir_token(&usuario(TipoUsuario::Owner), "segredo", 1).unwrap();
        assert!(validar_token(&token, "segredo").unwrap().exigir_dono().is_ok());
    }
}
