// src/vendas/vendas_router.rs

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use actix_web::{delete, get, post, put, web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{FixedOffset, Local};
use num_traits::Zero;
use sqlx::types::Json;
use sqlx::{query, query_as, query_scalar};

use super::carrinho::{calcular_pagamento, total_com_desconto, ErroCarrinho, ResumoSacola, Sacolas};
use super::historico::{exportar_csv, filtrar_vendas, recibo, somar_totais};
use super::vendas_structs::{
    AtualizarItem, Desconto, FiltrosVendas, FinalizarVenda, FormaPagamento, ItemVenda, ItemVendido, ListaVendas,
    StatusVenda, TipoDesconto, Venda,
};
use crate::caixa::caixa_router::registrar_venda_no_caixa;
use crate::clientes::clientes_router::buscar_cliente_para_atualizar;
use crate::clientes::clientes_structs::TipoTransacaoCliente;
use crate::clientes::fidelidade;
use crate::produtos::produtos_router::SELECT_PRODUTO;
use crate::produtos::produtos_structs::Produto;
use crate::shared::erro::ErroApi;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::AppState;

pub(crate) const SELECT_VENDA: &str = "SELECT id, market_id, order_number, itens, total, forma_pagamento, recebido, \
     troco, status, operador_id, operador_nome, cliente_id, cliente_nome, desconto, created_at FROM vendas";

pub(crate) const COLUNAS_VENDA: &str = "id, market_id, order_number, itens, total, forma_pagamento, recebido, troco, status, \
     operador_id, operador_nome, cliente_id, cliente_nome, desconto, created_at";

pub(crate) fn ler_sacolas(sacolas: &RwLock<Sacolas>) -> Result<RwLockReadGuard<'_, Sacolas>, ErroApi> {
    sacolas
        .read()
        .map_err(|_| ErroApi::Interno("Falha ao acessar a sacola.".to_string()))
}

pub(crate) fn escrever_sacolas(sacolas: &RwLock<Sacolas>) -> Result<RwLockWriteGuard<'_, Sacolas>, ErroApi> {
    sacolas
        .write()
        .map_err(|_| ErroApi::Interno("Falha ao acessar a sacola.".to_string()))
}

/// Fuso do servidor, usado para datas de filtros, CSV e recibos.
pub(crate) fn fuso_local() -> FixedOffset {
    *Local::now().offset()
}

/// Próximo número de pedido do mercado.
///
/// Bloqueia a linha do mercado até o fim da transação para que duas vendas
/// simultâneas não recebam o mesmo número.
pub(crate) async fn proximo_numero_pedido(conn: &mut sqlx::PgConnection, market_id: i32) -> Result<i32, ErroApi> {
    query("SELECT id FROM mercados WHERE id = $1 FOR UPDATE")
        .bind(market_id)
        .execute(&mut *conn)
        .await?;

    let numero = query_scalar::<_, i32>("SELECT COALESCE(MAX(order_number), 0) + 1 FROM vendas WHERE market_id = $1")
        .bind(market_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(numero)
}

/// Busca uma venda do mercado bloqueando a linha para atualização.
pub(crate) async fn buscar_venda_para_atualizar(
    executor: impl sqlx::postgres::PgExecutor<'_>,
    id: i32,
    market_id: i32,
) -> Result<Venda, ErroApi> {
    query_as::<_, Venda>(&format!("{} WHERE id = $1 AND market_id = $2 FOR UPDATE", SELECT_VENDA))
        .bind(id)
        .bind(market_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| ErroApi::nao_encontrado(format!("Venda com ID {} não encontrada.", id)))
}

/// Vendas pagas do mercado (comandas abertas ficam de fora), da mais recente à mais antiga.
async fn carregar_vendas_pagas(data: &AppState, market_id: i32) -> Result<Vec<Venda>, ErroApi> {
    let vendas = query_as::<_, Venda>(&format!(
        "{} WHERE market_id = $1 AND status <> 'open' ORDER BY created_at DESC, id DESC",
        SELECT_VENDA
    ))
    .bind(market_id)
    .fetch_all(&data.db_pool)
    .await?;
    Ok(vendas)
}

/// Rota para finalizar a venda com os itens da sacola do operador.
///
/// Tudo acontece numa única transação: baixa de estoque (com `FOR UPDATE`),
/// número do pedido, gravação da venda, pontos e conta-crédito do cliente e
/// o lançamento no caixa aberto. A sacola só é limpa depois do commit.
#[post("/venda")]
pub async fn realizar_venda(
    data: web::Data<AppState>,
    sacolas: web::Data<RwLock<Sacolas>>,
    user: AuthenticatedUser,
    pedido: web::Json<FinalizarVenda>,
) -> Result<HttpResponse, ErroApi> {
    let pedido = pedido.into_inner();
    let carrinho = ler_sacolas(&sacolas)?.do_operador(user.user_id);
    if carrinho.is_empty() {
        return Err(ErroCarrinho::SacolaVazia.into());
    }
    if pedido.pontos_resgatados.is_some() && pedido.desconto.is_some() {
        return Err(ErroApi::requisicao("Use apenas um tipo de desconto por venda."));
    }
    if pedido.desconto.as_ref().map_or(false, |d| *d < BigDecimal::zero()) {
        return Err(ErroApi::requisicao("O desconto não pode ser negativo."));
    }

    let mut transaction = data.db_pool.begin().await?;

    let comanda = match pedido.comanda_id {
        Some(id) => {
            let comanda = buscar_venda_para_atualizar(&mut *transaction, id, user.market_id).await?;
            if comanda.status != StatusVenda::Open {
                return Err(ErroApi::conflito(format!("A comanda #{} já foi fechada.", comanda.order_number)));
            }
            Some(comanda)
        }
        None => None,
    };

    let mut itens: Vec<ItemVendido> = Vec::with_capacity(carrinho.itens.len());
    let mut total = BigDecimal::zero();

    // Todas as linhas são travadas numa só consulta, em ordem de id, para que
    // vendas simultâneas com os mesmos produtos não entrem em deadlock.
    let produtos = query_as::<_, Produto>(&format!(
        "{} WHERE id = ANY($1) AND market_id = $2 ORDER BY id FOR UPDATE",
        SELECT_PRODUTO
    ))
    .bind(carrinho.ids_produtos())
    .bind(user.market_id)
    .fetch_all(&mut *transaction)
    .await?;

    for item in &carrinho.itens {
        let produto = produtos
            .iter()
            .find(|p| p.id == item.produto_id)
            .cloned()
            .ok_or_else(|| ErroApi::requisicao(format!("Produto com ID {} não encontrado para venda.", item.produto_id)))?;

        if produto.estoque < item.quantidade {
            tracing::warn!(
                produto_id = produto.id,
                disponivel = produto.estoque,
                solicitado = item.quantidade,
                "Estoque insuficiente na finalização da venda"
            );
            return Err(ErroApi::requisicao(format!(
                "Estoque insuficiente para o produto {}.",
                produto.nome
            )));
        }

        query("UPDATE produtos SET estoque = estoque - $1 WHERE id = $2")
            .bind(item.quantidade)
            .bind(produto.id)
            .execute(&mut *transaction)
            .await?;

        let vendido = ItemVendido {
            id: produto.id,
            nome: produto.nome,
            preco: produto.preco,
            qtd: item.quantidade,
        };
        total += vendido.subtotal();
        itens.push(vendido);
    }

    let cliente = match pedido.cliente_id {
        Some(id) => Some(buscar_cliente_para_atualizar(&mut *transaction, id, user.market_id).await?),
        None => None,
    };

    let desconto = match (pedido.pontos_resgatados, &pedido.desconto) {
        (Some(pontos), _) => {
            let cliente = cliente
                .as_ref()
                .ok_or_else(|| ErroApi::requisicao("Selecione um cliente para resgatar pontos."))?;
            let resgate = fidelidade::resgatar_pontos(cliente.pontos, pontos, &total)?;
            Some(Desconto {
                tipo: TipoDesconto::Points,
                valor: resgate.desconto,
                descricao: Some(format!("Resgate de {} pontos", resgate.pontos)),
                pontos: Some(resgate.pontos),
            })
        }
        (None, Some(valor)) if *valor > BigDecimal::zero() => Some(Desconto {
            tipo: TipoDesconto::Manual,
            valor: valor.clone(),
            descricao: pedido.descricao_desconto.clone(),
            pontos: None,
        }),
        _ => None,
    };

    let valor_desconto = desconto.as_ref().map_or_else(BigDecimal::zero, |d| d.valor.clone());
    let total_final = total_com_desconto(&total, &valor_desconto);
    let credito = cliente.as_ref().map(|c| c.credito_disponivel());
    let pagamento = calcular_pagamento(
        &total_final,
        pedido.forma_pagamento,
        pedido.recebido.as_ref(),
        credito.as_ref(),
    )?;

    let status = if pedido.enviar_cozinha {
        StatusVenda::Pending
    } else {
        StatusVenda::Completed
    };

    let venda = match &comanda {
        Some(comanda) => {
            query_as::<_, Venda>(&format!(
                "UPDATE vendas SET itens = $1, total = $2, forma_pagamento = $3, recebido = $4, troco = $5, \
                 status = $6, operador_id = $7, operador_nome = $8, cliente_id = $9, \
                 cliente_nome = COALESCE($10, cliente_nome), desconto = $11, created_at = now() \
                 WHERE id = $12 RETURNING {}",
                COLUNAS_VENDA
            ))
            .bind(Json(&itens))
            .bind(&pagamento.total)
            .bind(pedido.forma_pagamento.as_str())
            .bind(&pagamento.recebido)
            .bind(&pagamento.troco)
            .bind(status.as_str())
            .bind(user.user_id)
            .bind(&user.user_name)
            .bind(pedido.cliente_id)
            .bind(cliente.as_ref().map(|c| c.nome.clone()))
            .bind(desconto.as_ref().map(Json))
            .bind(comanda.id)
            .fetch_one(&mut *transaction)
            .await?
        }
        None => {
            let numero = proximo_numero_pedido(&mut *transaction, user.market_id).await?;
            query_as::<_, Venda>(&format!(
                "INSERT INTO vendas (market_id, order_number, itens, total, forma_pagamento, recebido, troco, \
                 status, operador_id, operador_nome, cliente_id, cliente_nome, desconto) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING {}",
                COLUNAS_VENDA
            ))
            .bind(user.market_id)
            .bind(numero)
            .bind(Json(&itens))
            .bind(&pagamento.total)
            .bind(pedido.forma_pagamento.as_str())
            .bind(&pagamento.recebido)
            .bind(&pagamento.troco)
            .bind(status.as_str())
            .bind(user.user_id)
            .bind(&user.user_name)
            .bind(pedido.cliente_id)
            .bind(cliente.as_ref().map(|c| c.nome.clone()))
            .bind(desconto.as_ref().map(Json))
            .fetch_one(&mut *transaction)
            .await?
        }
    };

    if let Some(cliente) = &cliente {
        let pontos_usados = desconto.as_ref().and_then(|d| d.pontos).unwrap_or(0);
        let conta = fidelidade::conta_apos_compra(
            cliente.pontos,
            &cliente.limite_credito,
            &cliente.saldo_devedor,
            pontos_usados,
            &total_final,
            pedido.forma_pagamento == FormaPagamento::CreditAccount,
        )?;

        query("UPDATE clientes SET pontos = $1, saldo_devedor = $2 WHERE id = $3")
            .bind(conta.pontos)
            .bind(&conta.saldo_devedor)
            .bind(cliente.id)
            .execute(&mut *transaction)
            .await?;

        if pedido.forma_pagamento == FormaPagamento::CreditAccount {
            query(
                "INSERT INTO transacoes_cliente (cliente_id, tipo, valor, venda_id, observacao) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(cliente.id)
            .bind(TipoTransacaoCliente::Purchase.as_str())
            .bind(&total_final)
            .bind(venda.id)
            .bind(format!("Pedido #{}", venda.order_number))
            .execute(&mut *transaction)
            .await?;
        }
    }

    let sessao_id =
        registrar_venda_no_caixa(&mut *transaction, user.user_id, &total_final, pedido.forma_pagamento).await?;

    transaction.commit().await?;
    escrever_sacolas(&sacolas)?.limpar(user.user_id);

    tracing::info!(
        venda_id = venda.id,
        pedido = venda.order_number,
        market_id = user.market_id,
        operador_id = user.user_id,
        total = %venda.total,
        forma = %venda.forma_pagamento,
        caixa = ?sessao_id,
        "Venda realizada"
    );

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso("Venda realizada com sucesso!", venda)))
}

/// Histórico de vendas com filtros de período, forma de pagamento e busca.
#[get("/vendas")]
pub async fn listar_vendas(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    filtros: web::Query<FiltrosVendas>,
) -> Result<HttpResponse, ErroApi> {
    let vendas = carregar_vendas_pagas(&data, user.market_id).await?;
    let vendas = filtrar_vendas(vendas, &filtros, Local::now().date_naive(), fuso_local());
    let total = somar_totais(&vendas);

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        format!("{} vendas encontradas", vendas.len()),
        ListaVendas { vendas, total },
    )))
}

/// Exporta o histórico filtrado em CSV.
#[get("/vendas/exportar.csv")]
pub async fn exportar_vendas(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    filtros: web::Query<FiltrosVendas>,
) -> Result<HttpResponse, ErroApi> {
    let vendas = carregar_vendas_pagas(&data, user.market_id).await?;
    let vendas = filtrar_vendas(vendas, &filtros, Local::now().date_naive(), fuso_local());
    let conteudo = exportar_csv(&vendas, fuso_local()).map_err(|e| {
        tracing::error!(erro = %e, "Falha ao gerar CSV de vendas");
        ErroApi::Interno("Erro ao gerar o arquivo de vendas.".to_string())
    })?;

    let arquivo = format!("vendas_{}.csv", Local::now().format("%Y-%m-%d"));
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(("Content-Disposition", format!("attachment; filename=\"{}\"", arquivo)))
        .body(conteudo))
}

#[get("/vendas/{id}")]
pub async fn buscar_venda_por_id(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();
    let venda = query_as::<_, Venda>(&format!("{} WHERE id = $1 AND market_id = $2", SELECT_VENDA))
        .bind(id)
        .bind(user.market_id)
        .fetch_optional(&data.db_pool)
        .await?
        .ok_or_else(|| ErroApi::nao_encontrado(format!("Venda com ID {} não encontrada.", id)))?;

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(format!("Pedido #{}", venda.order_number), venda)))
}

/// Recibo da venda em texto simples.
#[get("/vendas/{id}/recibo")]
pub async fn recibo_venda(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ErroApi> {
    let id = path.into_inner();
    let venda = query_as::<_, Venda>(&format!("{} WHERE id = $1 AND market_id = $2", SELECT_VENDA))
        .bind(id)
        .bind(user.market_id)
        .fetch_optional(&data.db_pool)
        .await?
        .ok_or_else(|| ErroApi::nao_encontrado(format!("Venda com ID {} não encontrada.", id)))?;

    let nome_mercado = query_scalar::<_, String>("SELECT nome FROM mercados WHERE id = $1")
        .bind(user.market_id)
        .fetch_one(&data.db_pool)
        .await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(recibo(&venda, &nome_mercado, fuso_local())))
}

// --- Rotas da sacola (uma por operador, em memória) ---

/// Rota para adicionar um item à sacola de compras.
#[post("/sacola/adicionar")]
pub async fn adicionar_item_sacola(
    data: web::Data<AppState>,
    sacolas: web::Data<RwLock<Sacolas>>,
    user: AuthenticatedUser,
    item_venda: web::Json<ItemVenda>,
) -> Result<HttpResponse, ErroApi> {
    let produto = query_as::<_, Produto>(&format!("{} WHERE id = $1 AND market_id = $2", SELECT_PRODUTO))
        .bind(item_venda.produto_id)
        .bind(user.market_id)
        .fetch_optional(&data.db_pool)
        .await?
        .ok_or_else(|| {
            ErroApi::requisicao(format!(
                "Produto com ID {} não encontrado para adicionar à sacola.",
                item_venda.produto_id
            ))
        })?;

    let resumo = {
        let mut todas = escrever_sacolas(&sacolas)?;
        let carrinho = todas.do_operador_mut(user.user_id);
        carrinho.adicionar(&produto, item_venda.quantidade)?;
        ResumoSacola::from(carrinho.clone())
    };

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        "Item adicionado/atualizado na sacola com sucesso!",
        resumo,
    )))
}

/// Define a quantidade de um item da sacola; zero remove o item.
#[put("/sacola/itens/{produto_id}")]
pub async fn atualizar_item_sacola(
    sacolas: web::Data<RwLock<Sacolas>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    item: web::Json<AtualizarItem>,
) -> Result<HttpResponse, ErroApi> {
    let produto_id = path.into_inner();
    let resumo = {
        let mut todas = escrever_sacolas(&sacolas)?;
        let carrinho = todas.do_operador_mut(user.user_id);
        carrinho.atualizar(produto_id, item.quantidade)?;
        ResumoSacola::from(carrinho.clone())
    };

    Ok(HttpResponse::Ok().json(GenericResponse::sucesso("Sacola atualizada.", resumo)))
}

/// Rota para visualizar o conteúdo atual da sacola de compras.
#[get("/sacola")]
pub async fn ver_sacola(
    sacolas: web::Data<RwLock<Sacolas>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ErroApi> {
    let carrinho = ler_sacolas(&sacolas)?.do_operador(user.user_id);
    Ok(HttpResponse::Ok().json(GenericResponse::sucesso(
        "Conteúdo da sacola",
        ResumoSacola::from(carrinho),
    )))
}

#[delete("/sacola")]
pub async fn limpar_sacola(
    sacolas: web::Data<RwLock<Sacolas>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ErroApi> {
    escrever_sacolas(&sacolas)?.limpar(user.user_id);
    Ok(HttpResponse::Ok().json(GenericResponse::ok("Sacola esvaziada.")))
}
